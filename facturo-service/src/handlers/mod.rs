//! HTTP handlers. Thin: extract, validate, call the database service, emit
//! the cache invalidation signal, shape the response.

mod documents;
mod payments;

pub use documents::{
    change_status, convert_quote, create_document, delete_document, get_document, list_documents,
    update_document,
};
pub use payments::{apply_payment, list_invoice_payments, remove_payment};

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use facturo_core::error::AppError;
use serde_json::json;

use crate::error::ServiceError;
use crate::services::metrics::{get_metrics, ERRORS_TOTAL};
use crate::startup::AppState;

/// Health check endpoint for liveness probes.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "facturo-service",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": "facturo-service",
                "error": e.to_string()
            })),
        ),
    }
}

/// Readiness check endpoint.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Prometheus metrics endpoint.
pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

/// Count the error on the metrics registry while converting it for the
/// response.
pub(crate) fn track<T>(result: Result<T, ServiceError>) -> Result<T, AppError> {
    result.map_err(|err| {
        ERRORS_TOTAL.with_label_values(&[err.metric_label()]).inc();
        err.into()
    })
}
