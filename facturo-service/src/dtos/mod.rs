//! Request and response payloads for the HTTP surface.
//!
//! Requests carry their declarative validation rules; whatever the derive
//! cannot express (date formats, decimal ranges) is checked during the
//! conversion into the service-layer input types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::status::DocumentKind;
use crate::error::ServiceError;
use crate::models::{
    ClientType, CreationStatus, Document, DocumentInput, DocumentItem, LineItemInput, NewClient,
    Payment, PaymentInput, PaymentMethod,
};

// -------------------------------------------------------------------------
// Requests
// -------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct DocumentRequest {
    pub client_id: Option<Uuid>,
    #[validate(nested)]
    pub new_client: Option<NewClientRequest>,
    #[serde(default)]
    pub status: CreationStatus,
    pub issue_date: String,
    pub due_date: Option<String>,
    pub expiry_date: Option<String>,
    #[validate(length(equal = 3, message = "currency code must be exactly 3 characters"))]
    pub currency_code: String,
    pub exchange_rate: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(length(max = 2000))]
    pub terms: Option<String>,
    #[validate(length(max = 2000))]
    pub internal_notes: Option<String>,
    pub origin_quote_id: Option<Uuid>,
    #[validate(nested)]
    #[serde(default)]
    pub items: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewClientRequest {
    #[serde(default)]
    pub client_type: ClientType,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 64))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 64))]
    pub tax_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LineItemRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom(function = validate_quantity))]
    pub quantity: Decimal,
    #[validate(custom(function = validate_unit_price))]
    pub unit_price: Decimal,
    #[validate(custom(function = validate_tax_rate))]
    pub tax_rate_percent: Option<Decimal>,
    #[serde(default)]
    pub is_service: bool,
    pub product_id: Option<Uuid>,
    pub tax_rate_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentRequest {
    #[validate(custom(function = validate_amount))]
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub paid_at: String,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    pub status: Option<String>,
    pub client_id: Option<Uuid>,
    pub page_size: Option<i32>,
    pub page_token: Option<Uuid>,
}

fn validate_quantity(quantity: &Decimal) -> Result<(), ValidationError> {
    if *quantity > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("quantity_not_positive"))
    }
}

fn validate_unit_price(unit_price: &Decimal) -> Result<(), ValidationError> {
    if *unit_price >= Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("unit_price_negative"))
    }
}

fn validate_tax_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if *rate >= Decimal::ZERO && *rate <= Decimal::ONE_HUNDRED {
        Ok(())
    } else {
        Err(ValidationError::new("tax_rate_out_of_range"))
    }
}

fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("amount_not_positive"))
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ServiceError::validation(field, format!("'{}' is not a YYYY-MM-DD date", value)))
}

impl DocumentRequest {
    /// Drop line items whose name is blank; pasted spreadsheet rows and empty
    /// trailing form rows arrive that way.
    pub fn drop_blank_items(&mut self) {
        self.items.retain(|item| !item.name.trim().is_empty());
    }

    /// Convert into the validated service input, parsing dates strictly.
    pub fn into_input(self, kind: DocumentKind) -> Result<DocumentInput, ServiceError> {
        let issue_date = parse_date("issue_date", &self.issue_date)?;
        let due_date = match (kind, &self.due_date) {
            (DocumentKind::Invoice, Some(raw)) => Some(parse_date("due_date", raw)?),
            _ => None,
        };
        let expiry_date = match (kind, &self.expiry_date) {
            (DocumentKind::Quote, Some(raw)) => Some(parse_date("expiry_date", raw)?),
            _ => None,
        };

        let items = self
            .items
            .into_iter()
            .map(|item| LineItemInput {
                name: item.name,
                quantity: item.quantity,
                unit_price: item.unit_price,
                tax_rate_percent: item.tax_rate_percent.unwrap_or(Decimal::ZERO),
                is_service: item.is_service,
                product_id: item.product_id,
                tax_rate_id: item.tax_rate_id,
            })
            .collect();

        Ok(DocumentInput {
            client_id: self.client_id,
            new_client: self.new_client.map(|c| NewClient {
                client_type: c.client_type,
                name: c.name,
                email: c.email,
                phone: c.phone,
                address: c.address,
                tax_id: c.tax_id,
            }),
            status: self.status,
            issue_date,
            due_date,
            expiry_date,
            currency_code: self.currency_code,
            exchange_rate: self.exchange_rate,
            notes: self.notes,
            terms: self.terms,
            internal_notes: self.internal_notes,
            origin_quote_id: if kind == DocumentKind::Invoice {
                self.origin_quote_id
            } else {
                None
            },
            items,
        })
    }
}

impl PaymentRequest {
    pub fn into_input(self) -> Result<PaymentInput, ServiceError> {
        let paid_at = parse_date("paid_at", &self.paid_at)?;
        Ok(PaymentInput {
            amount: self.amount,
            method: self.method,
            paid_at,
            note: self.note,
        })
    }
}

// -------------------------------------------------------------------------
// Responses
// -------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct DocumentCreatedResponse {
    pub id: Uuid,
    pub number: String,
}

#[derive(Debug, Serialize)]
pub struct LineItemResponse {
    pub id: Uuid,
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
}

impl From<DocumentItem> for LineItemResponse {
    fn from(item: DocumentItem) -> Self {
        LineItemResponse {
            id: item.id,
            name: item.name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            tax_rate_percent: item.tax_rate_percent,
            is_service: item.is_service,
            product_id: item.product_id,
            tax_rate_id: item.tax_rate_id,
            ht: item.ht,
            tva: item.tva,
            total: item.total,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
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
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<LineItemResponse>,
}

impl DocumentResponse {
    pub fn from_parts(document: Document, items: Vec<DocumentItem>) -> Self {
        DocumentResponse {
            id: document.id,
            kind: document.kind,
            number: document.number,
            client_id: document.client_id,
            status: document.status,
            issue_date: document.issue_date,
            due_date: document.due_date,
            expiry_date: document.expiry_date,
            currency_code: document.currency_code,
            exchange_rate: document.exchange_rate,
            subtotal: document.subtotal,
            tax_total: document.tax_total,
            total: document.total,
            notes: document.notes,
            terms: document.terms,
            internal_notes: document.internal_notes,
            origin_quote_id: document.origin_quote_id,
            items: items.into_iter().map(LineItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentResponse>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub payment_id: Uuid,
    pub new_status: String,
    pub paid_total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ConversionResponse {
    pub invoice_id: Uuid,
    pub invoice_number: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentRecordResponse {
    pub id: Uuid,
    pub amount: Decimal,
    pub method: String,
    pub paid_at: NaiveDate,
    pub note: Option<String>,
}

impl From<Payment> for PaymentRecordResponse {
    fn from(payment: Payment) -> Self {
        PaymentRecordResponse {
            id: payment.id,
            amount: payment.amount,
            method: payment.method,
            paid_at: payment.paid_at,
            note: payment.note,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentListResponse {
    pub payments: Vec<PaymentRecordResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_request() -> DocumentRequest {
        DocumentRequest {
            client_id: Some(Uuid::new_v4()),
            new_client: None,
            status: CreationStatus::Draft,
            issue_date: "2026-01-15".to_string(),
            due_date: Some("2026-02-15".to_string()),
            expiry_date: None,
            currency_code: "XOF".to_string(),
            exchange_rate: None,
            notes: None,
            terms: None,
            internal_notes: None,
            origin_quote_id: None,
            items: vec![LineItemRequest {
                name: "Consulting".to_string(),
                quantity: dec!(10),
                unit_price: dec!(50000),
                tax_rate_percent: Some(dec!(18)),
                is_service: true,
                product_id: None,
                tax_rate_id: None,
            }],
        }
    }

    #[test]
    fn valid_request_passes_validation() {
        assert!(base_request().validate().is_ok());
    }

    #[test]
    fn currency_code_must_be_three_characters() {
        let mut request = base_request();
        request.currency_code = "CFA FRANC".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn negative_unit_price_is_rejected() {
        let mut request = base_request();
        request.items[0].unit_price = dec!(-1);
        assert!(request.validate().is_err());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let mut request = base_request();
        request.items[0].quantity = Decimal::ZERO;
        assert!(request.validate().is_err());
    }

    #[test]
    fn tax_rate_above_100_is_rejected() {
        let mut request = base_request();
        request.items[0].tax_rate_percent = Some(dec!(100.5));
        assert!(request.validate().is_err());
    }

    #[test]
    fn blank_item_rows_are_dropped() {
        let mut request = base_request();
        request.items.push(LineItemRequest {
            name: "   ".to_string(),
            quantity: dec!(1),
            unit_price: dec!(1),
            tax_rate_percent: None,
            is_service: false,
            product_id: None,
            tax_rate_id: None,
        });
        request.drop_blank_items();
        assert_eq!(request.items.len(), 1);
    }

    #[test]
    fn malformed_issue_date_is_a_field_error() {
        let mut request = base_request();
        request.issue_date = "15/01/2026".to_string();
        let err = request.into_input(DocumentKind::Invoice).unwrap_err();
        match err {
            ServiceError::Validation { field, .. } => assert_eq!(field, "issue_date"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn expiry_date_is_ignored_for_invoices() {
        let mut request = base_request();
        request.expiry_date = Some("2026-03-01".to_string());
        let input = request.into_input(DocumentKind::Invoice).unwrap();
        assert!(input.expiry_date.is_none());
        assert!(input.due_date.is_some());
    }

    #[test]
    fn origin_quote_is_only_kept_on_invoices() {
        let mut request = base_request();
        request.origin_quote_id = Some(Uuid::new_v4());
        request.due_date = None;
        let input = request.into_input(DocumentKind::Quote).unwrap();
        assert!(input.origin_quote_id.is_none());
    }

    #[test]
    fn missing_tax_rate_defaults_to_zero() {
        let mut request = base_request();
        request.items[0].tax_rate_percent = None;
        let input = request.into_input(DocumentKind::Invoice).unwrap();
        assert_eq!(input.items[0].tax_rate_percent, Decimal::ZERO);
    }
}
