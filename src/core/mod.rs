//! Core types of the order intake: records, validation, errors and service traits

pub mod cache;
pub mod collector;
pub mod error;
pub mod order;
pub mod row;
pub mod service;
pub mod validation;

pub use cache::HandleCache;
pub use collector::{FormDescriptor, ItemSlots, OrderForm};
pub use error::{IntakeError, ValidationError};
pub use order::{ItemSpec, OrderDraft, OrderRecord, ProofAttachment, ValidatedOrder};
pub use row::{CellValue, Column, RowLayout};
pub use service::{BlobStore, ServiceConnector, Spreadsheet};
pub use validation::OrderValidator;
