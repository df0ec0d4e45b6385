//! Document model: the shared shape of invoices and quotes.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::status::{DocumentKind, InvoiceStatus, QuoteStatus};
use crate::models::{LineItemInput, NewClient};

/// Persisted document header. Line items live in their own table and are
/// owned exclusively by the document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub kind: String,
    pub number: String,
    pub client_id: Option<Uuid>,
    pub status: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub currency_code: String,
    pub exchange_rate: Option<Decimal>,
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub internal_notes: Option<String>,
    pub origin_quote_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        DocumentKind::from_string(&self.kind)
    }

    pub fn invoice_status(&self) -> InvoiceStatus {
        InvoiceStatus::from_string(&self.status)
    }

    pub fn quote_status(&self) -> QuoteStatus {
        QuoteStatus::from_string(&self.status)
    }
}

/// Status a document may carry at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CreationStatus {
    #[default]
    Draft,
    Sent,
}

impl CreationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreationStatus::Draft => "draft",
            CreationStatus::Sent => "sent",
        }
    }
}

/// Validated input for creating or updating a document.
///
/// Totals are never part of the input; they are recomputed server-side from
/// the items on every write.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub client_id: Option<Uuid>,
    pub new_client: Option<NewClient>,
    pub status: CreationStatus,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub currency_code: String,
    pub exchange_rate: Option<Decimal>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub internal_notes: Option<String>,
    pub origin_quote_id: Option<Uuid>,
    pub items: Vec<LineItemInput>,
}

/// Filter parameters for listing documents.
#[derive(Debug, Clone, Default)]
pub struct ListDocumentsFilter {
    pub status: Option<String>,
    pub client_id: Option<Uuid>,
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}
