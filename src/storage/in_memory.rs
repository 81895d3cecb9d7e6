//! In-memory spreadsheet and blob store for testing and development
//!
//! Every call is recorded in order, which makes the pipeline's sequencing
//! observable, and failures can be injected per worksheet or per service.

use crate::core::error::{ConnectivityError, ServiceKind, UploadError};
use crate::core::row::CellValue;
use crate::core::service::{BlobStore, NewObject, ServiceConnector, SheetError, Spreadsheet};
use async_trait::async_trait;
use axum::body::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// A call received by the backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Upload { name: String, parent: String },
    Append { worksheet: String, cells: Vec<CellValue> },
}

/// An object stored by the in-memory blob store
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub id: String,
    pub name: String,
    pub parent: String,
    pub mime_type: String,
    pub content: Bytes,
}

#[derive(Default)]
struct State {
    worksheets: HashMap<String, Vec<Vec<CellValue>>>,
    objects: Vec<StoredObject>,
    calls: Vec<BackendCall>,
    failing_worksheets: HashMap<String, String>,
    upload_failure: Option<String>,
    unreachable: HashSet<&'static str>,
}

/// In-memory backend implementing every service trait
///
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<RwLock<State>>,
    connects: Arc<AtomicUsize>,
}

impl InMemoryBackend {
    /// Create a backend with the given worksheets
    pub fn new<I, S>(worksheets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::default();
        if let Ok(mut state) = backend.state.write() {
            for name in worksheets {
                state.worksheets.insert(name.into(), Vec::new());
            }
        }
        backend
    }

    /// Make every append to `worksheet` fail with `message`
    pub fn fail_appends_to(&self, worksheet: impl Into<String>, message: impl Into<String>) {
        if let Ok(mut state) = self.state.write() {
            state
                .failing_worksheets
                .insert(worksheet.into(), message.into());
        }
    }

    /// Make every upload fail with `message`
    pub fn fail_uploads(&self, message: impl Into<String>) {
        if let Ok(mut state) = self.state.write() {
            state.upload_failure = Some(message.into());
        }
    }

    /// Make handle acquisition for `service` fail (or succeed again)
    pub fn set_reachable(&self, service: ServiceKind, reachable: bool) {
        if let Ok(mut state) = self.state.write() {
            if reachable {
                state.unreachable.remove(service.as_str());
            } else {
                state.unreachable.insert(service.as_str());
            }
        }
    }

    /// Rows appended to a worksheet, in order
    pub fn rows(&self, worksheet: &str) -> Vec<Vec<CellValue>> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.worksheets.get(worksheet).cloned())
            .unwrap_or_default()
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.state
            .read()
            .map(|state| state.objects.clone())
            .unwrap_or_default()
    }

    /// Every call received so far, including failed ones
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state
            .read()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }

    /// Number of handle acquisitions
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn check_reachable(&self, service: ServiceKind) -> Result<(), ConnectivityError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let state = self
            .state
            .read()
            .map_err(|e| ConnectivityError::new(service, format!("lock poisoned: {}", e)))?;
        if state.unreachable.contains(service.as_str()) {
            return Err(ConnectivityError::new(service, "service unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl Spreadsheet for InMemoryBackend {
    async fn append_row(&self, worksheet: &str, cells: Vec<CellValue>) -> Result<(), SheetError> {
        let mut state = self
            .state
            .write()
            .map_err(|e| SheetError::Failed(format!("Failed to acquire write lock: {}", e)))?;

        state.calls.push(BackendCall::Append {
            worksheet: worksheet.to_string(),
            cells: cells.clone(),
        });

        if let Some(message) = state.failing_worksheets.get(worksheet) {
            return Err(SheetError::Failed(message.clone()));
        }

        let rows = state
            .worksheets
            .get_mut(worksheet)
            .ok_or(SheetError::WorksheetNotFound)?;
        rows.push(cells);
        Ok(())
    }
}

#[async_trait]
impl BlobStore for InMemoryBackend {
    async fn create_object(&self, object: NewObject) -> Result<String, UploadError> {
        let mut state = self.state.write().map_err(|e| UploadError {
            object_name: object.name.clone(),
            message: format!("Failed to acquire write lock: {}", e),
        })?;

        state.calls.push(BackendCall::Upload {
            name: object.name.clone(),
            parent: object.parent.clone(),
        });

        if let Some(message) = &state.upload_failure {
            return Err(UploadError {
                object_name: object.name,
                message: message.clone(),
            });
        }

        let id = Uuid::new_v4().simple().to_string();
        state.objects.push(StoredObject {
            id: id.clone(),
            name: object.name,
            parent: object.parent,
            mime_type: object.mime_type,
            content: object.content,
        });
        Ok(id)
    }
}

#[async_trait]
impl ServiceConnector for InMemoryBackend {
    async fn connect_spreadsheet(&self) -> Result<Arc<dyn Spreadsheet>, ConnectivityError> {
        self.check_reachable(ServiceKind::Spreadsheet)?;
        Ok(Arc::new(self.clone()))
    }

    async fn connect_blob_store(&self) -> Result<Arc<dyn BlobStore>, ConnectivityError> {
        self.check_reachable(ServiceKind::BlobStore)?;
        Ok(Arc::new(self.clone()))
    }
}
