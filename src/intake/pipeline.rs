//! Submission pipeline
//!
//! One call to [`SubmissionPipeline::submit`] runs a submission through
//! `validating → connecting → uploading? → writing-detail → writing-summary`.
//! The first failing stage aborts the rest and its error is the only one
//! reported. Completed writes are never rolled back.

use crate::config::{Catalog, IntakeConfig};
use crate::core::cache::HandleCache;
use crate::core::error::{IntakeError, WriteError};
use crate::core::order::OrderDraft;
use crate::core::service::{BlobStore, ServiceConnector, Spreadsheet};
use crate::core::validation::OrderValidator;
use crate::intake::uploader::AttachmentUploader;
use crate::intake::writer::RecordWriter;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Source of submission timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Outcome of a successful submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub submission_id: Uuid,
    pub submitted_at: String,
    pub buyer_name: String,
    pub quantity: usize,
    pub proof_url: String,
    pub message: String,
}

/// Runs submissions against the configured services
pub struct SubmissionPipeline {
    catalog: Arc<Catalog>,
    connector: Arc<dyn ServiceConnector>,
    spreadsheet: HandleCache<Arc<dyn Spreadsheet>>,
    blob_store: HandleCache<Arc<dyn BlobStore>>,
    validator: OrderValidator,
    uploader: AttachmentUploader,
    writer: RecordWriter,
    clock: Arc<dyn Clock>,
}

impl SubmissionPipeline {
    pub fn new(config: &IntakeConfig, connector: Arc<dyn ServiceConnector>) -> Self {
        let catalog = Arc::new(config.catalog.clone());
        let ttl = config.server.handle_ttl();

        Self {
            validator: OrderValidator::new(catalog.clone()),
            uploader: AttachmentUploader::new(
                config.secrets.drive_folder_id.clone(),
                config.server.proof_view_base.clone(),
                catalog.proof_prefix.clone(),
            ),
            writer: RecordWriter::new(
                config.secrets.sheet_detail.clone(),
                config.secrets.sheet_rekap.clone(),
                config.layouts.clone(),
                catalog.item_label.clone(),
            ),
            catalog,
            connector,
            spreadsheet: HandleCache::new("spreadsheet", ttl),
            blob_store: HandleCache::new("blob_store", ttl),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the timestamp source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Drop both cached service handles
    pub async fn invalidate_handles(&self) {
        self.spreadsheet.invalidate().await;
        self.blob_store.invalidate().await;
    }

    /// Validate, upload and write one submission
    pub async fn submit(&self, draft: OrderDraft) -> Result<SubmissionReceipt, IntakeError> {
        let submission_id = Uuid::new_v4();
        let span = info_span!("submission", %submission_id);

        let result = self.run(submission_id, draft).instrument(span.clone()).await;

        let _entered = span.enter();
        match &result {
            Ok(receipt) => info!(
                buyer = %receipt.buyer_name,
                quantity = receipt.quantity,
                "order recorded"
            ),
            Err(e @ IntakeError::Validation(_)) => {
                warn!(stage = e.stage(), error = %e, "submission rejected")
            }
            Err(e) => error!(stage = e.stage(), error = %e, "submission failed"),
        }
        result
    }

    async fn run(
        &self,
        submission_id: Uuid,
        draft: OrderDraft,
    ) -> Result<SubmissionReceipt, IntakeError> {
        let order = self.validator.validate(draft)?;
        let now = self.clock.now();

        let sheet = self.spreadsheet().await?;

        let proof_url = match order.proof() {
            Some(proof) => {
                let store = self.blob_store().await?;
                let uploaded = self
                    .uploader
                    .upload(store.as_ref(), order.buyer_name(), proof, &now)
                    .await;
                match uploaded {
                    Ok(url) => Some(url),
                    Err(e) => {
                        self.blob_store.invalidate().await;
                        return Err(e.into());
                    }
                }
            }
            None => None,
        };

        let record = order.into_record(submission_id, now.naive_local(), proof_url);

        if let Err(e) = self.writer.write(sheet.as_ref(), &record).await {
            if matches!(e, WriteError::Failed { .. }) {
                self.spreadsheet.invalidate().await;
            }
            return Err(e.into());
        }

        Ok(SubmissionReceipt {
            submission_id,
            submitted_at: record.timestamp(),
            message: format!("Order for {} was recorded", record.buyer_name),
            quantity: record.quantity(),
            proof_url: record.proof_reference().to_string(),
            buyer_name: record.buyer_name,
        })
    }

    async fn spreadsheet(&self) -> Result<Arc<dyn Spreadsheet>, IntakeError> {
        let connector = self.connector.clone();
        self.spreadsheet
            .get_or_try_init(|| async move { connector.connect_spreadsheet().await })
            .await
            .map_err(IntakeError::from)
    }

    async fn blob_store(&self) -> Result<Arc<dyn BlobStore>, IntakeError> {
        let connector = self.connector.clone();
        self.blob_store
            .get_or_try_init(|| async move { connector.connect_blob_store().await })
            .await
            .map_err(IntakeError::from)
    }
}
