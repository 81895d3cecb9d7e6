//! Router builder for the order routes

use crate::intake::handlers::{AppState, describe_form, submit_order};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build the order routes
///
/// - GET /form - Describe the form (`?quantity=n&payment_status=...`)
/// - POST /orders - Submit an order as `multipart/form-data`
pub fn build_order_routes(state: AppState) -> Router {
    let limit = state.body_limit;

    Router::new()
        .route("/form", get(describe_form))
        .route(
            "/orders",
            post(submit_order).layer(DefaultBodyLimit::max(limit)),
        )
        .with_state(state)
}
