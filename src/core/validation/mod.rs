//! Order validation
//!
//! Rules run in a fixed precedence and stop at the first violation, so the
//! user only ever sees one message at a time:
//!
//! 1. required text fields non-blank and quantity at least 1
//! 2. item count matches quantity and every choice is in the catalog
//! 3. the proof-required payment status carries a proof
//! 4. an attached proof has an accepted type and size
//!
//! Service connectivity is checked later by the pipeline and reported as its
//! own error category.

pub mod validators;

use crate::config::Catalog;
use crate::core::error::ValidationError;
use crate::core::order::{OrderDraft, ValidatedOrder};
use std::sync::Arc;
use validator::Validate;
use validators::{acceptable_attachment, one_of};

/// Required fields in the order they appear on the form
const REQUIRED_FIELDS: [&str; 5] = ["coordinator", "buyer_name", "phone", "address", "quantity"];

/// Checks order drafts against the configured catalog
#[derive(Debug, Clone)]
pub struct OrderValidator {
    catalog: Arc<Catalog>,
}

impl OrderValidator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Validate a draft, returning the trimmed order or the first violation
    pub fn validate(&self, draft: OrderDraft) -> Result<ValidatedOrder, ValidationError> {
        if let Err(errors) = draft.validate() {
            let field_errors = errors.field_errors();
            let fields = REQUIRED_FIELDS
                .iter()
                .filter(|field| field_errors.contains_key(**field))
                .map(|field| field.to_string())
                .collect();
            return Err(ValidationError::MissingRequiredFields { fields });
        }

        if draft.items.len() != draft.quantity as usize {
            return Err(ValidationError::ItemCountMismatch {
                expected: draft.quantity as usize,
                actual: draft.items.len(),
            });
        }

        let size = one_of(&self.catalog.sizes);
        let sleeve = one_of(&self.catalog.sleeve_styles);
        for (i, item) in draft.items.iter().enumerate() {
            size(&format!("size_{}", i + 1), &item.size)?;
            sleeve(&format!("sleeve_{}", i + 1), &item.sleeve)?;
        }
        one_of(&self.catalog.payment_statuses)("payment_status", &draft.payment_status)?;

        let needs_proof = self.catalog.requires_proof(&draft.payment_status);
        if needs_proof {
            match draft.proof.as_ref().filter(|proof| !proof.is_empty()) {
                None => {
                    return Err(ValidationError::MissingPaymentProof {
                        status: draft.payment_status.clone(),
                    });
                }
                Some(proof) => acceptable_attachment(
                    &self.catalog.proof_extensions,
                    self.catalog.max_proof_bytes,
                )(proof)?,
            }
        }

        Ok(ValidatedOrder::from_draft(draft, needs_proof))
    }
}
