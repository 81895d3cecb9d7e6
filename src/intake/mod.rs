//! Order intake: upload, row writes, the submission pipeline and its HTTP handlers

pub mod handlers;
pub mod pipeline;
pub mod uploader;
pub mod writer;

pub use handlers::{AppState, describe_form, submit_order};
pub use pipeline::{Clock, FixedClock, SubmissionPipeline, SubmissionReceipt, SystemClock};
pub use uploader::AttachmentUploader;
pub use writer::RecordWriter;
