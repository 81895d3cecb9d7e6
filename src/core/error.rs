//! Typed error handling for the order intake service
//!
//! Every failure a submission can hit maps to one variant of [`IntakeError`],
//! so handlers can render a readable message and the right HTTP status while
//! callers can still match on the precise cause.
//!
//! # Error Categories
//!
//! - [`ConfigError`]: missing or malformed configuration (fatal at startup)
//! - [`ConnectivityError`]: a service handle could not be acquired
//! - [`ValidationError`]: missing or contradictory field values
//! - [`UploadError`]: the blob store rejected the payment proof
//! - [`WriteError`]: a row append failed (destination missing or generic)
//! - [`RequestError`]: the submission body could not be read
//!
//! # Example
//!
//! ```rust,ignore
//! match pipeline.submit(draft).await {
//!     Ok(receipt) => println!("{}", receipt.message),
//!     Err(IntakeError::Write(WriteError::DestinationNotFound { worksheet, .. })) => {
//!         eprintln!("worksheet '{}' does not exist", worksheet);
//!     }
//!     Err(e) => eprintln!("submission failed: {}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type for the intake service
#[derive(Debug)]
pub enum IntakeError {
    /// Configuration errors
    Config(ConfigError),

    /// A spreadsheet or blob store handle could not be established
    Connectivity(ConnectivityError),

    /// Field validation errors
    Validation(ValidationError),

    /// Payment proof upload errors
    Upload(UploadError),

    /// Row append errors
    Write(WriteError),

    /// Malformed submission body
    Request(RequestError),
}

impl fmt::Display for IntakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntakeError::Config(e) => write!(f, "{}", e),
            IntakeError::Connectivity(e) => write!(f, "{}", e),
            IntakeError::Validation(e) => write!(f, "{}", e),
            IntakeError::Upload(e) => write!(f, "{}", e),
            IntakeError::Write(e) => write!(f, "{}", e),
            IntakeError::Request(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for IntakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IntakeError::Config(e) => Some(e),
            IntakeError::Connectivity(e) => Some(e),
            IntakeError::Validation(e) => Some(e),
            IntakeError::Upload(e) => Some(e),
            IntakeError::Write(e) => Some(e),
            IntakeError::Request(e) => Some(e),
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message, shown to the user as-is
    pub message: String,
    /// Pipeline stage the submission failed at
    pub stage: &'static str,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntakeError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            IntakeError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            IntakeError::Connectivity(_) => StatusCode::SERVICE_UNAVAILABLE,
            IntakeError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            IntakeError::Upload(_) => StatusCode::BAD_GATEWAY,
            IntakeError::Write(_) => StatusCode::BAD_GATEWAY,
            IntakeError::Request(e) => e.status_code(),
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            IntakeError::Config(_) => "CONFIG_ERROR",
            IntakeError::Connectivity(_) => "SERVICE_UNAVAILABLE",
            IntakeError::Validation(e) => e.error_code(),
            IntakeError::Upload(_) => "UPLOAD_FAILED",
            IntakeError::Write(e) => e.error_code(),
            IntakeError::Request(e) => e.error_code(),
        }
    }

    /// Name of the pipeline stage this error aborts
    pub fn stage(&self) -> &'static str {
        match self {
            IntakeError::Config(_) => "startup",
            IntakeError::Connectivity(_) => "connecting",
            IntakeError::Validation(_) => "validating",
            IntakeError::Upload(_) => "uploading",
            IntakeError::Write(e) => e.destination().stage(),
            IntakeError::Request(_) => "collecting",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            stage: self.stage(),
            details: self.details(),
        }
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            IntakeError::Validation(ValidationError::MissingRequiredFields { fields }) => {
                Some(serde_json::json!({ "fields": fields }))
            }
            IntakeError::Validation(ValidationError::InvalidChoice {
                field,
                value,
                allowed,
            }) => Some(serde_json::json!({
                "field": field,
                "value": value,
                "allowed": allowed
            })),
            IntakeError::Write(
                WriteError::DestinationNotFound {
                    destination,
                    worksheet,
                }
                | WriteError::Failed {
                    destination,
                    worksheet,
                    ..
                },
            ) => Some(serde_json::json!({
                "destination": destination.as_str(),
                "worksheet": worksheet
            })),
            _ => None,
        }
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// A required key is absent
    MissingKey { key: String },

    /// Failed to parse configuration
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Configuration file not found
    FileNotFound { path: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingKey { key } => {
                write!(
                    f,
                    "Configuration error: required key '{}' was not found",
                    key
                )
            }
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::FileNotFound { path } => {
                write!(f, "Configuration file not found: {}", path)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for IntakeError {
    fn from(err: ConfigError) -> Self {
        IntakeError::Config(err)
    }
}

// =============================================================================
// Connectivity Errors
// =============================================================================

/// External service a handle is acquired for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Spreadsheet,
    BlobStore,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Spreadsheet => "spreadsheet",
            ServiceKind::BlobStore => "blob store",
        }
    }
}

/// A service handle could not be established
#[derive(Debug)]
pub struct ConnectivityError {
    pub service: ServiceKind,
    pub message: String,
}

impl ConnectivityError {
    pub fn new(service: ServiceKind, message: impl Into<String>) -> Self {
        Self {
            service,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to connect to the {} service: {}. Check the service credentials",
            self.service.as_str(),
            self.message
        )
    }
}

impl std::error::Error for ConnectivityError {}

impl From<ConnectivityError> for IntakeError {
    fn from(err: ConnectivityError) -> Self {
        IntakeError::Connectivity(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to order field validation
#[derive(Debug)]
pub enum ValidationError {
    /// One or more required fields are empty (or quantity is zero)
    MissingRequiredFields { fields: Vec<String> },

    /// Number of item specs does not match quantity
    ItemCountMismatch { expected: usize, actual: usize },

    /// Value is not part of the configured choice set
    InvalidChoice {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    /// The payment status requires a proof that was not attached
    MissingPaymentProof { status: String },

    /// The attached proof is not acceptable
    InvalidAttachment { message: String },
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::MissingRequiredFields { .. } => "MISSING_REQUIRED_FIELDS",
            ValidationError::ItemCountMismatch { .. } => "ITEM_COUNT_MISMATCH",
            ValidationError::InvalidChoice { .. } => "INVALID_CHOICE",
            ValidationError::MissingPaymentProof { .. } => "MISSING_PAYMENT_PROOF",
            ValidationError::InvalidAttachment { .. } => "INVALID_ATTACHMENT",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingRequiredFields { fields } => {
                write!(
                    f,
                    "Please fill in all required fields (missing: {})",
                    fields.join(", ")
                )
            }
            ValidationError::ItemCountMismatch { expected, actual } => {
                write!(
                    f,
                    "Expected details for {} item(s) but received {}",
                    expected, actual
                )
            }
            ValidationError::InvalidChoice {
                field,
                value,
                allowed,
            } => {
                write!(
                    f,
                    "'{}' is not a valid choice for {} (allowed: {})",
                    value,
                    field,
                    allowed.join(", ")
                )
            }
            ValidationError::MissingPaymentProof { status } => {
                write!(
                    f,
                    "Please upload the proof of payment when the payment status is '{}'",
                    status
                )
            }
            ValidationError::InvalidAttachment { message } => {
                write!(f, "Invalid proof of payment: {}", message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for IntakeError {
    fn from(err: ValidationError) -> Self {
        IntakeError::Validation(err)
    }
}

// =============================================================================
// Upload Errors
// =============================================================================

/// The blob store call failed
#[derive(Debug)]
pub struct UploadError {
    /// Object name the upload was attempted under
    pub object_name: String,
    /// Underlying cause
    pub message: String,
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to upload '{}' to the file store: {}. Check the folder id and the service account permissions",
            self.object_name, self.message
        )
    }
}

impl std::error::Error for UploadError {}

impl From<UploadError> for IntakeError {
    fn from(err: UploadError) -> Self {
        IntakeError::Upload(err)
    }
}

// =============================================================================
// Write Errors
// =============================================================================

/// Which of the two worksheets a row was destined for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Detail,
    Summary,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Detail => "detail",
            Destination::Summary => "summary",
        }
    }

    /// Pipeline stage name for writes to this destination
    pub fn stage(&self) -> &'static str {
        match self {
            Destination::Detail => "writing-detail",
            Destination::Summary => "writing-summary",
        }
    }
}

/// Errors raised while appending a row
#[derive(Debug)]
pub enum WriteError {
    /// The worksheet name could not be resolved
    DestinationNotFound {
        destination: Destination,
        worksheet: String,
    },

    /// Any other append failure
    Failed {
        destination: Destination,
        worksheet: String,
        message: String,
    },
}

impl WriteError {
    pub fn destination(&self) -> Destination {
        match self {
            WriteError::DestinationNotFound { destination, .. } => *destination,
            WriteError::Failed { destination, .. } => *destination,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            WriteError::DestinationNotFound { .. } => "DESTINATION_NOT_FOUND",
            WriteError::Failed { .. } => "WRITE_FAILED",
        }
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::DestinationNotFound {
                destination,
                worksheet,
            } => {
                write!(
                    f,
                    "Worksheet '{}' ({}) was not found. Make sure the sheet name matches the configuration",
                    worksheet,
                    destination.as_str()
                )
            }
            WriteError::Failed {
                destination,
                worksheet,
                message,
            } => {
                write!(
                    f,
                    "Failed to save the order to worksheet '{}' ({}): {}",
                    worksheet,
                    destination.as_str(),
                    message
                )
            }
        }
    }
}

impl std::error::Error for WriteError {}

impl From<WriteError> for IntakeError {
    fn from(err: WriteError) -> Self {
        IntakeError::Write(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to reading the submission body
#[derive(Debug)]
pub enum RequestError {
    /// The multipart body could not be read
    InvalidBody { message: String },

    /// A field carried an unusable value
    InvalidField { field: String, message: String },

    /// The body exceeded the configured limit
    BodyTooLarge { limit: usize },
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::InvalidBody { .. } => StatusCode::BAD_REQUEST,
            RequestError::InvalidField { .. } => StatusCode::BAD_REQUEST,
            RequestError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::InvalidBody { .. } => "INVALID_BODY",
            RequestError::InvalidField { .. } => "INVALID_FIELD",
            RequestError::BodyTooLarge { .. } => "BODY_TOO_LARGE",
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidBody { message } => {
                write!(f, "Invalid request body: {}", message)
            }
            RequestError::InvalidField { field, message } => {
                write!(f, "Invalid value for '{}': {}", field, message)
            }
            RequestError::BodyTooLarge { limit } => {
                write!(f, "Request body exceeds the limit of {} bytes", limit)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl From<RequestError> for IntakeError {
    fn from(err: RequestError) -> Self {
        IntakeError::Request(err)
    }
}
