//! HTTP handlers for the order form
//!
//! - `GET /form` describes the form for a given quantity and payment status
//! - `POST /orders` accepts a multipart submission and runs it through the pipeline

use axum::{
    Json,
    extract::{Multipart, Query, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::core::collector::{FormDescriptor, OrderForm};
use crate::core::error::{IntakeError, RequestError};
use crate::core::order::ProofAttachment;
use crate::intake::pipeline::SubmissionPipeline;

/// Multipart field carrying the payment-proof image
pub const PROOF_FIELD: &str = "payment_proof";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SubmissionPipeline>,

    /// Largest accepted request body, in bytes
    pub body_limit: usize,
}

/// Query parameters of `GET /form`
#[derive(Debug, Default, Deserialize)]
pub struct FormQuery {
    pub quantity: Option<String>,
    pub payment_status: Option<String>,
}

/// Describe the form with `quantity` item slots and the proof field visibility
/// matching `payment_status`
pub async fn describe_form(
    State(state): State<AppState>,
    Query(query): Query<FormQuery>,
) -> Result<Json<FormDescriptor>, IntakeError> {
    let mut form = OrderForm::new(state.pipeline.catalog().clone());

    if let Some(quantity) = query.quantity {
        form.apply_field("quantity", quantity)?;
    }
    if let Some(status) = query.payment_status {
        form.apply_field("payment_status", status)?;
    }

    Ok(Json(form.descriptor()))
}

/// Submit an order
///
/// Returns `201 Created` with the submission receipt, or the error of the
/// first stage that failed.
pub async fn submit_order(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, IntakeError> {
    let (fields, proof) = read_multipart(multipart, state.body_limit).await?;

    let form = OrderForm::from_fields(state.pipeline.catalog().clone(), fields, proof)?;
    let receipt = state.pipeline.submit(form.snapshot()).await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Split a multipart body into text fields and the optional proof file
async fn read_multipart(
    mut multipart: Multipart,
    body_limit: usize,
) -> Result<(Vec<(String, String)>, Option<ProofAttachment>), RequestError> {
    let mut fields = Vec::new();
    let mut proof = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, body_limit))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == PROOF_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let content = field
                .bytes()
                .await
                .map_err(|e| multipart_error(e, body_limit))?;
            proof = Some(ProofAttachment::new(file_name, content_type, content));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| multipart_error(e, body_limit))?;
            fields.push((name, value));
        }
    }

    Ok((fields, proof))
}

fn multipart_error(err: MultipartError, body_limit: usize) -> RequestError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RequestError::BodyTooLarge { limit: body_limit }
    } else {
        RequestError::InvalidBody {
            message: err.body_text(),
        }
    }
}
