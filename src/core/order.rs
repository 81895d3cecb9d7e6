//! Order records as they move through the intake pipeline
//!
//! A submission starts as an [`OrderDraft`] (raw collector snapshot), becomes a
//! [`ValidatedOrder`] once the validator accepts it, and finally an
//! [`OrderRecord`] when the pipeline stamps the submission time and resolves
//! the payment-proof reference. Records are write-once; nothing updates them.

use crate::core::validation::validators::not_blank;
use axum::body::Bytes;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Cell value written when no payment proof was uploaded
pub const NO_PROOF: &str = "N/A";

/// Format of the submission timestamp cell
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Size and sleeve style of one ordered item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub size: String,
    pub sleeve: String,
}

impl ItemSpec {
    pub fn new(size: impl Into<String>, sleeve: impl Into<String>) -> Self {
        Self {
            size: size.into(),
            sleeve: sleeve.into(),
        }
    }
}

/// Uploaded payment-proof image
#[derive(Clone)]
pub struct ProofAttachment {
    /// File name as sent by the client
    pub file_name: String,
    /// Declared MIME type
    pub content_type: String,
    pub content: Bytes,
}

impl ProofAttachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    /// Lowercased extension of the original file name, if it has one
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// File extension, falling back to one derived from the MIME type
    pub fn resolved_extension(&self) -> Option<String> {
        self.extension().or_else(|| {
            let ext = match self.content_type.to_ascii_lowercase().as_str() {
                "image/png" => "png",
                "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
                "image/gif" => "gif",
                "image/webp" => "webp",
                "application/pdf" => "pdf",
                _ => return None,
            };
            Some(ext.to_string())
        })
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl fmt::Debug for ProofAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofAttachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.content.len())
            .finish()
    }
}

/// Snapshot of the form at the moment the user submits it
#[derive(Debug, Clone, Validate)]
pub struct OrderDraft {
    #[validate(custom(function = "not_blank"))]
    pub coordinator: String,

    #[validate(custom(function = "not_blank"))]
    pub buyer_name: String,

    #[validate(custom(function = "not_blank"))]
    pub phone: String,

    #[validate(custom(function = "not_blank"))]
    pub address: String,

    #[validate(range(min = 1))]
    pub quantity: u32,

    pub items: Vec<ItemSpec>,
    pub payment_status: String,
    pub proof: Option<ProofAttachment>,
}

/// An order that passed validation; text fields are trimmed
#[derive(Debug, Clone)]
pub struct ValidatedOrder {
    coordinator: String,
    buyer_name: String,
    phone: String,
    address: String,
    items: Vec<ItemSpec>,
    payment_status: String,
    proof: Option<ProofAttachment>,
}

impl ValidatedOrder {
    /// Only the validator builds these
    pub(crate) fn from_draft(draft: OrderDraft, keep_proof: bool) -> Self {
        Self {
            coordinator: draft.coordinator.trim().to_string(),
            buyer_name: draft.buyer_name.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            address: draft.address.trim().to_string(),
            items: draft.items,
            payment_status: draft.payment_status,
            proof: if keep_proof { draft.proof } else { None },
        }
    }

    pub fn buyer_name(&self) -> &str {
        &self.buyer_name
    }

    pub fn items(&self) -> &[ItemSpec] {
        &self.items
    }

    /// The proof to upload; present only when the payment status requires one
    pub fn proof(&self) -> Option<&ProofAttachment> {
        self.proof.as_ref()
    }

    /// Stamp the order and attach the resolved proof URL
    pub fn into_record(
        self,
        submission_id: Uuid,
        submitted_at: NaiveDateTime,
        proof_url: Option<String>,
    ) -> OrderRecord {
        OrderRecord {
            submission_id,
            submitted_at,
            coordinator: self.coordinator,
            buyer_name: self.buyer_name,
            phone: self.phone,
            address: self.address,
            items: self.items,
            payment_status: self.payment_status,
            proof_url,
        }
    }
}

/// Fully resolved order, ready to be written
#[derive(Debug, Clone, Serialize)]
pub struct OrderRecord {
    pub submission_id: Uuid,
    pub submitted_at: NaiveDateTime,
    pub coordinator: String,
    pub buyer_name: String,
    pub phone: String,
    pub address: String,
    pub items: Vec<ItemSpec>,
    pub payment_status: String,
    pub proof_url: Option<String>,
}

impl OrderRecord {
    pub fn quantity(&self) -> usize {
        self.items.len()
    }

    pub fn timestamp(&self) -> String {
        self.submitted_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Proof URL, or the `N/A` sentinel
    pub fn proof_reference(&self) -> &str {
        self.proof_url.as_deref().unwrap_or(NO_PROOF)
    }

    /// One-line description of every item, e.g. `Baju 1: M-Pendek; Baju 2: L-Panjang`
    pub fn item_detail(&self, label: &str) -> String {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{} {}: {}-{}", label, i + 1, item.size, item.sleeve))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(items: Vec<ItemSpec>, proof_url: Option<String>) -> OrderRecord {
        OrderRecord {
            submission_id: Uuid::nil(),
            submitted_at: NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_opt(8, 5, 7)
                .unwrap(),
            coordinator: "Pak Budi".to_string(),
            buyer_name: "Siti Aminah".to_string(),
            phone: "081234567890".to_string(),
            address: "Jl. Merdeka 1".to_string(),
            items,
            payment_status: "Belum Bayar".to_string(),
            proof_url,
        }
    }

    #[test]
    fn test_item_detail_joins_items_in_order() {
        let r = record(
            vec![ItemSpec::new("M", "Pendek"), ItemSpec::new("L", "Panjang")],
            None,
        );
        assert_eq!(r.item_detail("Baju"), "Baju 1: M-Pendek; Baju 2: L-Panjang");
        assert_eq!(r.quantity(), 2);
    }

    #[test]
    fn test_proof_reference_falls_back_to_sentinel() {
        let r = record(vec![ItemSpec::new("S", "Pendek")], None);
        assert_eq!(r.proof_reference(), "N/A");

        let r = record(
            vec![ItemSpec::new("S", "Pendek")],
            Some("https://host/uc?export=view&id=abc".to_string()),
        );
        assert_eq!(r.proof_reference(), "https://host/uc?export=view&id=abc");
    }

    #[test]
    fn test_timestamp_is_zero_padded() {
        let r = record(vec![ItemSpec::new("S", "Pendek")], None);
        assert_eq!(r.timestamp(), "2024-03-09 08:05:07");
    }

    #[test]
    fn test_extension_uses_last_dot() {
        let proof = ProofAttachment::new("struk.transfer.JPG", "image/jpeg", vec![1u8]);
        assert_eq!(proof.extension().as_deref(), Some("jpg"));

        let proof = ProofAttachment::new("struk", "image/jpeg", vec![1u8]);
        assert_eq!(proof.extension(), None);

        let proof = ProofAttachment::new(".png", "image/png", vec![1u8]);
        assert_eq!(proof.extension(), None);
    }

    #[test]
    fn test_resolved_extension_falls_back_to_mime() {
        let proof = ProofAttachment::new("struk", "image/jpeg", vec![1u8]);
        assert_eq!(proof.resolved_extension().as_deref(), Some("jpg"));

        let proof = ProofAttachment::new("struk", "application/octet-stream", vec![1u8]);
        assert_eq!(proof.resolved_extension(), None);
    }

    #[test]
    fn test_debug_hides_content() {
        let proof = ProofAttachment::new("a.png", "image/png", vec![0u8; 16]);
        let debug = format!("{:?}", proof);
        assert!(debug.contains("len: 16"));
    }
}
