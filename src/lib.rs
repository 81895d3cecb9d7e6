//! # orderform
//!
//! Intake service for group apparel orders.
//!
//! A buyer fills in contact details, a quantity, the size and sleeve style of
//! each item and a payment status. When the status is a bank transfer a
//! payment-proof image is required. A submission is validated, the proof is
//! uploaded to a file store, and two rows are appended to a spreadsheet: a
//! detail row listing every item and a summary row carrying the quantity.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use orderform::prelude::*;
//!
//! let config = IntakeConfig::from_yaml_file("orderform.yaml")?;
//! let app = ServerBuilder::new()
//!     .with_config(config)
//!     .with_connector(InMemoryBackend::new(["Detail", "Rekap"]))
//!     .build()?;
//! ```
//!
//! The Google Sheets and Drive backend is available behind the `google`
//! feature as [`storage::GoogleConnector`].

pub mod config;
pub mod core;
pub mod intake;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        cache::HandleCache,
        collector::{FormDescriptor, OrderForm},
        error::{IntakeError, ValidationError},
        order::{ItemSpec, OrderDraft, OrderRecord, ProofAttachment},
        row::{CellValue, Column, RowLayout},
        service::{BlobStore, ServiceConnector, Spreadsheet},
        validation::OrderValidator,
    };

    // === Intake ===
    pub use crate::intake::{
        Clock, FixedClock, SubmissionPipeline, SubmissionReceipt, SystemClock,
    };

    // === Storage ===
    pub use crate::storage::InMemoryBackend;
    #[cfg(feature = "google")]
    pub use crate::storage::GoogleConnector;

    // === Config ===
    pub use crate::config::{Catalog, IntakeConfig, LayoutConfig, ServerConfig};

    // === Server ===
    pub use crate::server::ServerBuilder;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
}
