//! Business-rule error taxonomy.
//!
//! Every service operation returns `Result<_, ServiceError>` so callers can
//! branch on the rejection without unwinding. Only persistence failures are
//! opaque; they are logged where they occur and surfaced as a generic retry
//! message.

use facturo_core::error::AppError;
use thiserror::Error;

use crate::domain::status::TransitionError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("document not found")]
    NotFound,

    #[error("document is locked and can no longer be edited")]
    DocumentLocked,

    #[error("only draft documents can be deleted")]
    NotDraft,

    #[error("invoice is closed and does not accept payments")]
    InvoiceClosed,

    #[error("quote cannot be converted in its current state")]
    InvalidState,

    #[error("status transition from {from} to {to} is not allowed")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("a client id or an inline client is required")]
    NoClient,

    #[error("at least one line item is required")]
    EmptyItems,

    #[error("payment amount exceeds the remaining balance")]
    AmountExceedsBalance,

    #[error("document number was already taken, retry the operation")]
    NumberCollision,

    #[error("transaction failed")]
    Transaction(#[source] anyhow::Error),
}

impl ServiceError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Label used on the error counter metric.
    pub fn metric_label(&self) -> &'static str {
        match self {
            ServiceError::Validation { .. } => "validation",
            ServiceError::NotFound => "not_found",
            ServiceError::DocumentLocked => "document_locked",
            ServiceError::NotDraft => "not_draft",
            ServiceError::InvoiceClosed => "invoice_closed",
            ServiceError::InvalidState => "invalid_state",
            ServiceError::InvalidTransition { .. } => "invalid_transition",
            ServiceError::NoClient => "no_client",
            ServiceError::EmptyItems => "empty_items",
            ServiceError::AmountExceedsBalance => "amount_exceeds_balance",
            ServiceError::NumberCollision => "number_collision",
            ServiceError::Transaction(_) => "transaction",
        }
    }
}

impl From<TransitionError> for ServiceError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Locked => ServiceError::DocumentLocked,
            TransitionError::Invalid { from, to } => ServiceError::InvalidTransition { from, to },
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("documents_org_number_key") =>
            {
                ServiceError::NumberCollision
            }
            _ => ServiceError::Transaction(anyhow::Error::new(err)),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation { field, message } => {
                AppError::FieldValidation { field, message }
            }
            ServiceError::NotFound => AppError::NotFound(anyhow::anyhow!("{}", err)),
            ServiceError::NumberCollision => AppError::Conflict(anyhow::anyhow!("{}", err)),
            ServiceError::Transaction(cause) => AppError::DatabaseError(cause),
            // Remaining variants are business-rule rejections the caller can
            // act on.
            other => AppError::BadRequest(anyhow::anyhow!("{}", other)),
        }
    }
}
