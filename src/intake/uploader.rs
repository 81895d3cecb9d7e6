//! Payment-proof upload

use crate::core::error::UploadError;
use crate::core::order::ProofAttachment;
use crate::core::service::{BlobStore, NewObject};
use chrono::{DateTime, TimeZone};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Stores payment proofs in the configured folder and resolves their view URL
#[derive(Debug, Clone)]
pub struct AttachmentUploader {
    folder_id: String,
    view_base: String,
    prefix: String,
}

impl AttachmentUploader {
    pub fn new(
        folder_id: impl Into<String>,
        view_base: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            folder_id: folder_id.into(),
            view_base: view_base.into(),
            prefix: prefix.into(),
        }
    }

    /// Object name: `<prefix>_<buyer>_<seconds>.<micros>.<ext>`
    pub fn object_name<Tz: TimeZone>(
        &self,
        buyer_name: &str,
        proof: &ProofAttachment,
        at: &DateTime<Tz>,
    ) -> String {
        let extension = proof
            .resolved_extension()
            .unwrap_or_else(|| "bin".to_string());
        format!(
            "{}_{}_{}.{:06}.{}",
            self.prefix,
            sanitize_name(buyer_name),
            at.timestamp(),
            at.timestamp_subsec_micros(),
            extension
        )
    }

    /// Public view URL for a stored object
    pub fn view_url(&self, object_id: &str) -> String {
        format!("{}{}", self.view_base, object_id)
    }

    /// Upload the proof and return its public view URL
    ///
    /// Every call creates a new object. Failures are returned as-is; nothing
    /// is retried or cleaned up.
    pub async fn upload<Tz: TimeZone>(
        &self,
        store: &dyn BlobStore,
        buyer_name: &str,
        proof: &ProofAttachment,
        at: &DateTime<Tz>,
    ) -> Result<String, UploadError> {
        let name = self.object_name(buyer_name, proof, at);
        debug!(object = %name, bytes = proof.len(), "uploading payment proof");

        let object_id = store
            .create_object(NewObject {
                name,
                parent: self.folder_id.clone(),
                content: proof.content.clone(),
                mime_type: proof.content_type.clone(),
            })
            .await?;

        Ok(self.view_url(&object_id))
    }
}

/// Make a buyer name safe for use in an object name
///
/// Whitespace becomes `_`; anything outside `[A-Za-z0-9_.-]` is dropped.
pub fn sanitize_name(name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.\-]").unwrap());

    let underscored: String = name
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    let cleaned = unsafe_chars.replace_all(&underscored, "").into_owned();

    if cleaned.is_empty() {
        "order".to_string()
    } else {
        cleaned
    }
}
