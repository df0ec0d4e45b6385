//! Quote-to-invoice conversion.
//!
//! The conversion trusts the quote's already-validated totals and copies them
//! verbatim instead of recomputing; items are copied 1:1 with new ownership.

use chrono::{Datelike, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::numbering;
use crate::domain::status::{DocumentKind, QuoteStatus};
use crate::error::ServiceError;
use crate::models::DocumentItem;
use crate::services::database::Database;
use crate::services::metrics::{DB_QUERY_DURATION, DOCUMENTS_TOTAL};

/// Result of converting a quote.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub invoice_id: Uuid,
    pub invoice_number: String,
}

impl Database {
    /// Convert a quote into a new draft invoice.
    ///
    /// The quote must be SENT or ACCEPTED; it ends up ACCEPTED either way.
    /// Nothing prevents converting the same quote again if it re-enters an
    /// eligible state; each conversion creates a fresh invoice referencing
    /// the quote.
    #[instrument(skip(self), fields(organization_id = %organization_id, quote_id = %quote_id))]
    pub async fn convert_quote(
        &self,
        organization_id: Uuid,
        quote_id: Uuid,
    ) -> Result<ConversionOutcome, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["convert_quote"])
            .start_timer();

        let mut tx = self.pool.begin().await?;

        let quote = self
            .lock_document(&mut tx, organization_id, DocumentKind::Quote, quote_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let quote_status = quote.quote_status();
        if !matches!(quote_status, QuoteStatus::Sent | QuoteStatus::Accepted) {
            return Err(ServiceError::InvalidState);
        }

        let items = sqlx::query_as::<_, DocumentItem>(
            r#"
            SELECT id, document_id, organization_id, name, quantity, unit_price,
                tax_rate_percent, is_service, product_id, tax_rate_id,
                ht, tva, total, sort_order, created_utc
            FROM document_items
            WHERE organization_id = $1 AND document_id = $2
            ORDER BY sort_order, created_utc
            "#,
        )
        .bind(organization_id)
        .bind(quote_id)
        .fetch_all(&mut *tx)
        .await?;

        let issue_date = Utc::now().date_naive();
        let year = issue_date.year();
        let seq = self
            .next_document_seq(&mut tx, organization_id, DocumentKind::Invoice, year)
            .await?;
        let invoice_number = numbering::format_number(DocumentKind::Invoice, year, seq);

        let invoice_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO documents (
                id, organization_id, kind, number, client_id, status,
                issue_date, due_date, expiry_date, currency_code, exchange_rate,
                subtotal, tax_total, total, notes, terms, internal_notes, origin_quote_id
            )
            VALUES ($1, $2, 'invoice', $3, $4, 'draft', $5, NULL, NULL, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(invoice_id)
        .bind(organization_id)
        .bind(&invoice_number)
        .bind(quote.client_id)
        .bind(issue_date)
        .bind(&quote.currency_code)
        .bind(quote.exchange_rate)
        .bind(quote.subtotal)
        .bind(quote.tax_total)
        .bind(quote.total)
        .bind(&quote.notes)
        .bind(&quote.terms)
        .bind(&quote.internal_notes)
        .bind(quote_id)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO document_items (
                    id, document_id, organization_id, name, quantity, unit_price,
                    tax_rate_percent, is_service, product_id, tax_rate_id,
                    ht, tva, total, sort_order
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(invoice_id)
            .bind(organization_id)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.tax_rate_percent)
            .bind(item.is_service)
            .bind(item.product_id)
            .bind(item.tax_rate_id)
            .bind(item.ht)
            .bind(item.tva)
            .bind(item.total)
            .bind(item.sort_order)
            .execute(&mut *tx)
            .await?;
        }

        if quote_status != QuoteStatus::Accepted {
            sqlx::query(
                "UPDATE documents SET status = 'accepted', updated_utc = NOW() WHERE organization_id = $1 AND id = $2",
            )
            .bind(organization_id)
            .bind(quote_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        timer.observe_duration();
        DOCUMENTS_TOTAL.with_label_values(&["invoice", "draft"]).inc();

        info!(
            quote_id = %quote_id,
            invoice_id = %invoice_id,
            invoice_number = %invoice_number,
            "Quote converted to invoice"
        );

        Ok(ConversionOutcome {
            invoice_id,
            invoice_number,
        })
    }
}
