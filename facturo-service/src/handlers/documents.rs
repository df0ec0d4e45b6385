//! Document handlers: create, read, update, delete, status changes, and
//! quote conversion. All operations are scoped to the organization from the
//! request context.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use facturo_core::error::AppError;
use facturo_core::middleware::OrgContext;
use uuid::Uuid;
use validator::Validate;

use crate::domain::status::DocumentKind;
use crate::dtos::{
    ChangeStatusRequest, ConversionResponse, DocumentCreatedResponse, DocumentListResponse,
    DocumentRequest, DocumentResponse, ListQuery, StatusResponse,
};
use crate::handlers::track;
use crate::models::ListDocumentsFilter;
use crate::startup::AppState;

/// Create a document within the organization's scope.
pub async fn create_document(
    State(state): State<AppState>,
    org: OrgContext,
    Path(kind): Path<DocumentKind>,
    Json(mut payload): Json<DocumentRequest>,
) -> Result<(StatusCode, Json<DocumentCreatedResponse>), AppError> {
    payload.drop_blank_items();
    payload.validate()?;
    let input = track(payload.into_input(kind))?;

    tracing::info!(
        organization_id = %org.organization_id,
        kind = kind.as_str(),
        items = input.items.len(),
        "Creating document"
    );

    let document = track(
        state
            .db
            .create_document(org.organization_id, kind, &input)
            .await,
    )?;

    state
        .invalidator
        .invalidate(org.organization_id, kind, document.id)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(DocumentCreatedResponse {
            id: document.id,
            number: document.number,
        }),
    ))
}

/// Update a document, replacing its line items wholesale.
pub async fn update_document(
    State(state): State<AppState>,
    org: OrgContext,
    Path((kind, document_id)): Path<(DocumentKind, Uuid)>,
    Json(mut payload): Json<DocumentRequest>,
) -> Result<Json<DocumentCreatedResponse>, AppError> {
    payload.drop_blank_items();
    payload.validate()?;
    let input = track(payload.into_input(kind))?;

    tracing::info!(
        organization_id = %org.organization_id,
        document_id = %document_id,
        kind = kind.as_str(),
        "Updating document"
    );

    let document = track(
        state
            .db
            .update_document(org.organization_id, kind, document_id, &input)
            .await,
    )?;

    state
        .invalidator
        .invalidate(org.organization_id, kind, document.id)
        .await;

    Ok(Json(DocumentCreatedResponse {
        id: document.id,
        number: document.number,
    }))
}

/// Delete a draft document.
pub async fn delete_document(
    State(state): State<AppState>,
    org: OrgContext,
    Path((kind, document_id)): Path<(DocumentKind, Uuid)>,
) -> Result<StatusCode, AppError> {
    tracing::info!(
        organization_id = %org.organization_id,
        document_id = %document_id,
        kind = kind.as_str(),
        "Deleting document"
    );

    track(
        state
            .db
            .delete_document(org.organization_id, kind, document_id)
            .await,
    )?;

    state
        .invalidator
        .invalidate(org.organization_id, kind, document_id)
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Get a document with its line items.
pub async fn get_document(
    State(state): State<AppState>,
    org: OrgContext,
    Path((kind, document_id)): Path<(DocumentKind, Uuid)>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = state
        .db
        .get_document(org.organization_id, kind, document_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("document not found")))?;

    let items = state
        .db
        .get_document_items(org.organization_id, document_id)
        .await?;

    Ok(Json(DocumentResponse::from_parts(document, items)))
}

/// List documents of one kind.
pub async fn list_documents(
    State(state): State<AppState>,
    org: OrgContext,
    Path(kind): Path<DocumentKind>,
    Query(query): Query<ListQuery>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let filter = ListDocumentsFilter {
        status: query.status,
        client_id: query.client_id,
        page_size: query.page_size.unwrap_or(50),
        page_token: query.page_token,
    };

    let documents = state
        .db
        .list_documents(org.organization_id, kind, &filter)
        .await?;

    Ok(Json(DocumentListResponse {
        documents: documents
            .into_iter()
            .map(|d| DocumentResponse::from_parts(d, Vec::new()))
            .collect(),
    }))
}

/// Request a status transition.
pub async fn change_status(
    State(state): State<AppState>,
    org: OrgContext,
    Path((kind, document_id)): Path<(DocumentKind, Uuid)>,
    Json(payload): Json<ChangeStatusRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    tracing::info!(
        organization_id = %org.organization_id,
        document_id = %document_id,
        kind = kind.as_str(),
        target = %payload.status,
        "Changing document status"
    );

    let outcome = track(
        state
            .db
            .change_status(org.organization_id, kind, document_id, &payload.status)
            .await,
    )?;

    if outcome.changed {
        state
            .invalidator
            .invalidate(org.organization_id, kind, document_id)
            .await;
    }

    Ok(Json(StatusResponse {
        status: outcome.status,
    }))
}

/// Convert a quote into a new draft invoice.
pub async fn convert_quote(
    State(state): State<AppState>,
    org: OrgContext,
    Path(quote_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ConversionResponse>), AppError> {
    tracing::info!(
        organization_id = %org.organization_id,
        quote_id = %quote_id,
        "Converting quote to invoice"
    );

    let outcome = track(state.db.convert_quote(org.organization_id, quote_id).await)?;

    state
        .invalidator
        .invalidate(org.organization_id, DocumentKind::Quote, quote_id)
        .await;
    state
        .invalidator
        .invalidate(org.organization_id, DocumentKind::Invoice, outcome.invoice_id)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(ConversionResponse {
            invoice_id: outcome.invoice_id,
            invoice_number: outcome.invoice_number,
        }),
    ))
}
