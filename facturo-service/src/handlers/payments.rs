//! Payment handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use facturo_core::error::AppError;
use facturo_core::middleware::OrgContext;
use uuid::Uuid;
use validator::Validate;

use crate::domain::status::DocumentKind;
use crate::dtos::{PaymentListResponse, PaymentRecordResponse, PaymentRequest, PaymentResponse};
use crate::handlers::track;
use crate::startup::AppState;

/// Apply a payment against an invoice.
pub async fn apply_payment(
    State(state): State<AppState>,
    org: OrgContext,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), AppError> {
    payload.validate()?;
    let input = track(payload.into_input())?;

    tracing::info!(
        organization_id = %org.organization_id,
        invoice_id = %invoice_id,
        amount = %input.amount,
        "Applying payment"
    );

    let outcome = track(
        state
            .db
            .apply_payment(org.organization_id, invoice_id, &input)
            .await,
    )?;

    state
        .invalidator
        .invalidate(org.organization_id, DocumentKind::Invoice, invoice_id)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(PaymentResponse {
            payment_id: outcome.payment_id,
            new_status: outcome.new_status.as_str().to_string(),
            paid_total: outcome.paid_total,
        }),
    ))
}

/// List the payments applied to an invoice.
pub async fn list_invoice_payments(
    State(state): State<AppState>,
    org: OrgContext,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<PaymentListResponse>, AppError> {
    let payments = state
        .db
        .list_payments(org.organization_id, invoice_id)
        .await?;

    Ok(Json(PaymentListResponse {
        payments: payments
            .into_iter()
            .map(PaymentRecordResponse::from)
            .collect(),
    }))
}

/// Delete a payment and recompute the invoice status.
pub async fn remove_payment(
    State(state): State<AppState>,
    org: OrgContext,
    Path(payment_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    tracing::info!(
        organization_id = %org.organization_id,
        payment_id = %payment_id,
        "Removing payment"
    );

    let outcome = track(state.db.remove_payment(org.organization_id, payment_id).await)?;

    state
        .invalidator
        .invalidate(
            org.organization_id,
            DocumentKind::Invoice,
            outcome.invoice_id,
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
