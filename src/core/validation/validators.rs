//! Reusable field validators
//!
//! `not_blank` plugs into the `validator` derive on the order draft; the
//! closure builders are applied by [`super::OrderValidator`] against the
//! configured catalog.

use crate::core::error::ValidationError;
use crate::core::order::ProofAttachment;

/// Validator: text is non-empty after trimming
pub fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        Err(validator::ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

/// Validator: value must be one of the allowed choices
pub fn one_of(
    allowed: &[String],
) -> impl Fn(&str, &str) -> Result<(), ValidationError> + Send + Sync + Clone + '_ {
    move |field: &str, value: &str| {
        if allowed.iter().any(|choice| choice == value) {
            Ok(())
        } else {
            Err(ValidationError::InvalidChoice {
                field: field.to_string(),
                value: value.to_string(),
                allowed: allowed.to_vec(),
            })
        }
    }
}

/// Validator: attachment has an accepted extension and fits the size limit
pub fn acceptable_attachment(
    extensions: &[String],
    max_bytes: usize,
) -> impl Fn(&ProofAttachment) -> Result<(), ValidationError> + Send + Sync + Clone + '_ {
    move |proof: &ProofAttachment| {
        let Some(ext) = proof.resolved_extension() else {
            return Err(ValidationError::InvalidAttachment {
                message: format!("cannot determine the file type of '{}'", proof.file_name),
            });
        };

        if !extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext)) {
            return Err(ValidationError::InvalidAttachment {
                message: format!(
                    "'.{}' files are not accepted (allowed: {})",
                    ext,
                    extensions.join(", ")
                ),
            });
        }

        if proof.len() > max_bytes {
            return Err(ValidationError::InvalidAttachment {
                message: format!(
                    "file is {} bytes, the limit is {} bytes",
                    proof.len(),
                    max_bytes
                ),
            });
        }

        Ok(())
    }
}
