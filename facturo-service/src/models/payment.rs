//! Payment model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    MobileMoney,
    Card,
    Check,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::Card => "card",
            PaymentMethod::Check => "check",
            PaymentMethod::Other => "other",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "cash" => PaymentMethod::Cash,
            "bank_transfer" => PaymentMethod::BankTransfer,
            "mobile_money" => PaymentMethod::MobileMoney,
            "card" => PaymentMethod::Card,
            "check" => PaymentMethod::Check,
            _ => PaymentMethod::Other,
        }
    }
}

/// Payment applied against an invoice. Owned exclusively by the invoice;
/// deleting one triggers a status recomputation on the owner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub organization_id: Uuid,
    pub amount: Decimal,
    pub method: String,
    pub paid_at: NaiveDate,
    pub note: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Validated input for applying a payment.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub paid_at: NaiveDate,
    pub note: Option<String>,
}
