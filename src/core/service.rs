//! Service traits for the external sinks
//!
//! The pipeline only ever talks to these traits. Concrete backends live in
//! [`crate::storage`]: an in-memory backend for development and tests, and the
//! Google backend behind the `google` feature.

use crate::core::cache::Expiring;
use crate::core::error::{ConnectivityError, Destination, UploadError, WriteError};
use crate::core::row::CellValue;
use async_trait::async_trait;
use axum::body::Bytes;
use std::sync::Arc;
use std::time::Instant;

/// A spreadsheet that rows can be appended to, one worksheet at a time
#[async_trait]
pub trait Spreadsheet: Send + Sync {
    /// Append one row of cells to the named worksheet
    ///
    /// An unknown worksheet must be reported as
    /// [`SheetError::WorksheetNotFound`], not as a generic failure.
    async fn append_row(&self, worksheet: &str, cells: Vec<CellValue>) -> Result<(), SheetError>;

    /// When the credentials behind this handle stop being accepted
    fn expires_at(&self) -> Option<Instant> {
        None
    }
}

impl Expiring for Arc<dyn Spreadsheet> {
    fn expires_at(&self) -> Option<Instant> {
        Spreadsheet::expires_at(self.as_ref())
    }
}

/// Failure of a single append, before it is attributed to a destination
#[derive(Debug, Clone, PartialEq)]
pub enum SheetError {
    WorksheetNotFound,
    Failed(String),
}

impl SheetError {
    /// Attribute the failure to a destination worksheet
    pub fn into_write_error(self, destination: Destination, worksheet: &str) -> WriteError {
        match self {
            SheetError::WorksheetNotFound => WriteError::DestinationNotFound {
                destination,
                worksheet: worksheet.to_string(),
            },
            SheetError::Failed(message) => WriteError::Failed {
                destination,
                worksheet: worksheet.to_string(),
                message,
            },
        }
    }
}

/// Object to create in the blob store
#[derive(Debug, Clone)]
pub struct NewObject {
    pub name: String,
    /// Parent container (folder) id
    pub parent: String,
    pub content: Bytes,
    pub mime_type: String,
}

/// A file store that accepts new objects
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create a new object and return its id
    async fn create_object(&self, object: NewObject) -> Result<String, UploadError>;

    /// When the credentials behind this handle stop being accepted
    fn expires_at(&self) -> Option<Instant> {
        None
    }
}

impl Expiring for Arc<dyn BlobStore> {
    fn expires_at(&self) -> Option<Instant> {
        BlobStore::expires_at(self.as_ref())
    }
}

/// Acquires fresh handles to the external services
///
/// Handles are cached by the pipeline, so a connector is only called on the
/// first submission and after a handle expires or is invalidated.
#[async_trait]
pub trait ServiceConnector: Send + Sync {
    async fn connect_spreadsheet(&self) -> Result<Arc<dyn Spreadsheet>, ConnectivityError>;

    async fn connect_blob_store(&self) -> Result<Arc<dyn BlobStore>, ConnectivityError>;
}
