//! Line item model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Line item on a document. Amounts are computed server-side at write time
/// and stored alongside the pricing inputs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentItem {
    pub id: Uuid,
    pub document_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub tax_rate_percent: Decimal,
    pub is_service: bool,
    pub product_id: Option<Uuid>,
    pub tax_rate_id: Option<Uuid>,
    pub ht: Decimal,
    pub tva: Decimal,
    pub total: Decimal,
    pub sort_order: i32,
    pub created_utc: DateTime<Utc>,
}

/// Validated input for one line item.
#[derive(Debug, Clone)]
pub struct LineItemInput {
    pub name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub tax_rate_percent: Decimal,
    pub is_service: bool,
    pub product_id: Option<Uuid>,
    pub tax_rate_id: Option<Uuid>,
}
