//! Document mutation operations: create, update, delete, status changes.
//!
//! Every write recomputes the monetary totals from the submitted items and
//! persists header + items in a single transaction. Line items are replaced
//! wholesale on update; there is no per-line patching.

use chrono::Datelike;
use sqlx::postgres::Postgres;
use sqlx::Transaction;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::status::{DocumentKind, QuoteStatus, StatusMachine, request_transition};
use crate::domain::{money, numbering};
use crate::error::ServiceError;
use crate::models::{Document, DocumentInput, LineItemInput};
use crate::services::database::Database;
use crate::services::metrics::{DB_QUERY_DURATION, DOCUMENTS_TOTAL};

/// Result of a status-change request.
#[derive(Debug, Clone)]
pub struct ChangeStatusOutcome {
    pub status: String,
    /// False when the request was an idempotent no-op.
    pub changed: bool,
}

impl Database {
    /// Create a document with its line items.
    ///
    /// When the input references an origin quote (invoice creation from a
    /// quote form), the quote is marked ACCEPTED *after* the transaction
    /// commits, as a secondary best-effort step: its failure is logged and
    /// never rolls back the created invoice.
    #[instrument(skip(self, input), fields(organization_id = %organization_id, kind = kind.as_str()))]
    pub async fn create_document(
        &self,
        organization_id: Uuid,
        kind: DocumentKind,
        input: &DocumentInput,
    ) -> Result<Document, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_document"])
            .start_timer();

        if input.items.is_empty() {
            return Err(ServiceError::EmptyItems);
        }
        let totals = compute_totals(&input.items);

        let mut tx = self.pool.begin().await?;

        let client_id = match (input.client_id, &input.new_client) {
            (Some(id), _) => id,
            (None, Some(new_client)) => {
                self.insert_client(&mut tx, organization_id, new_client).await?
            }
            (None, None) => return Err(ServiceError::NoClient),
        };

        let year = input.issue_date.year();
        let seq = self
            .next_document_seq(&mut tx, organization_id, kind, year)
            .await?;
        let number = numbering::format_number(kind, year, seq);

        let document_id = Uuid::new_v4();
        let document = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (
                id, organization_id, kind, number, client_id, status,
                issue_date, due_date, expiry_date, currency_code, exchange_rate,
                subtotal, tax_total, total, notes, terms, internal_notes, origin_quote_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING id, organization_id, kind, number, client_id, status,
                issue_date, due_date, expiry_date, currency_code, exchange_rate,
                subtotal, tax_total, total, notes, terms, internal_notes,
                origin_quote_id, created_utc, updated_utc
            "#,
        )
        .bind(document_id)
        .bind(organization_id)
        .bind(kind.as_str())
        .bind(&number)
        .bind(client_id)
        .bind(input.status.as_str())
        .bind(input.issue_date)
        .bind(input.due_date)
        .bind(input.expiry_date)
        .bind(&input.currency_code)
        .bind(input.exchange_rate)
        .bind(totals.subtotal)
        .bind(totals.tax_total)
        .bind(totals.total)
        .bind(&input.notes)
        .bind(&input.terms)
        .bind(&input.internal_notes)
        .bind(input.origin_quote_id)
        .fetch_one(&mut *tx)
        .await?;

        self.insert_items(&mut tx, organization_id, document_id, &input.items)
            .await?;

        tx.commit().await?;

        timer.observe_duration();
        DOCUMENTS_TOTAL
            .with_label_values(&[kind.as_str(), &document.status])
            .inc();

        info!(
            document_id = %document.id,
            number = %document.number,
            total = %document.total,
            "Document created"
        );

        if kind == DocumentKind::Invoice {
            if let Some(quote_id) = input.origin_quote_id {
                match self.mark_quote_accepted(organization_id, quote_id).await {
                    Ok(true) => {}
                    Ok(false) => {
                        warn!(quote_id = %quote_id, "Origin quote not in an acceptable state")
                    }
                    Err(e) => {
                        warn!(quote_id = %quote_id, error = %e, "Failed to mark origin quote accepted")
                    }
                }
            }
        }

        Ok(document)
    }

    /// Update a document's header and replace all of its line items.
    #[instrument(skip(self, input), fields(organization_id = %organization_id, document_id = %document_id))]
    pub async fn update_document(
        &self,
        organization_id: Uuid,
        kind: DocumentKind,
        document_id: Uuid,
        input: &DocumentInput,
    ) -> Result<Document, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_document"])
            .start_timer();

        if input.items.is_empty() {
            return Err(ServiceError::EmptyItems);
        }
        let totals = compute_totals(&input.items);

        let mut tx = self.pool.begin().await?;

        let existing = self
            .lock_document(&mut tx, organization_id, kind, document_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let locked = match kind {
            DocumentKind::Invoice => existing.invoice_status().is_content_locked(),
            DocumentKind::Quote => existing.quote_status().is_content_locked(),
        };
        if locked {
            return Err(ServiceError::DocumentLocked);
        }

        let client_id = match (input.client_id, &input.new_client) {
            (Some(id), _) => id,
            (None, Some(new_client)) => {
                self.insert_client(&mut tx, organization_id, new_client).await?
            }
            (None, None) => return Err(ServiceError::NoClient),
        };

        let document = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET client_id = $3,
                issue_date = $4,
                due_date = $5,
                expiry_date = $6,
                currency_code = $7,
                exchange_rate = $8,
                subtotal = $9,
                tax_total = $10,
                total = $11,
                notes = $12,
                terms = $13,
                internal_notes = $14,
                updated_utc = NOW()
            WHERE organization_id = $1 AND id = $2
            RETURNING id, organization_id, kind, number, client_id, status,
                issue_date, due_date, expiry_date, currency_code, exchange_rate,
                subtotal, tax_total, total, notes, terms, internal_notes,
                origin_quote_id, created_utc, updated_utc
            "#,
        )
        .bind(organization_id)
        .bind(document_id)
        .bind(client_id)
        .bind(input.issue_date)
        .bind(input.due_date)
        .bind(input.expiry_date)
        .bind(&input.currency_code)
        .bind(input.exchange_rate)
        .bind(totals.subtotal)
        .bind(totals.tax_total)
        .bind(totals.total)
        .bind(&input.notes)
        .bind(&input.terms)
        .bind(&input.internal_notes)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM document_items WHERE organization_id = $1 AND document_id = $2")
            .bind(organization_id)
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

        self.insert_items(&mut tx, organization_id, document_id, &input.items)
            .await?;

        tx.commit().await?;

        timer.observe_duration();

        info!(
            document_id = %document.id,
            number = %document.number,
            total = %document.total,
            "Document updated"
        );

        Ok(document)
    }

    /// Hard-delete a draft document and its line items.
    #[instrument(skip(self), fields(organization_id = %organization_id, document_id = %document_id))]
    pub async fn delete_document(
        &self,
        organization_id: Uuid,
        kind: DocumentKind,
        document_id: Uuid,
    ) -> Result<(), ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_document"])
            .start_timer();

        let existing = self
            .get_document(organization_id, kind, document_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if existing.status != "draft" {
            return Err(ServiceError::NotDraft);
        }

        let result = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE organization_id = $1 AND kind = $2 AND id = $3 AND status = 'draft'
            "#,
        )
        .bind(organization_id)
        .bind(kind.as_str())
        .bind(document_id)
        .execute(&self.pool)
        .await?;

        timer.observe_duration();

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotDraft);
        }

        info!(document_id = %document_id, "Draft document deleted");

        Ok(())
    }

    /// Request a status transition.
    #[instrument(skip(self), fields(organization_id = %organization_id, document_id = %document_id, target = target))]
    pub async fn change_status(
        &self,
        organization_id: Uuid,
        kind: DocumentKind,
        document_id: Uuid,
        target: &str,
    ) -> Result<ChangeStatusOutcome, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["change_status"])
            .start_timer();

        let mut tx = self.pool.begin().await?;

        let document = self
            .lock_document(&mut tx, organization_id, kind, document_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let applied: Option<&'static str> = match kind {
            DocumentKind::Invoice => {
                let requested = crate::domain::status::InvoiceStatus::parse(target)
                    .ok_or_else(|| {
                        ServiceError::validation(
                            "status",
                            format!("unknown invoice status '{}'", target),
                        )
                    })?;
                request_transition(document.invoice_status(), requested)?.map(|s| s.as_str())
            }
            DocumentKind::Quote => {
                let requested = QuoteStatus::parse(target).ok_or_else(|| {
                    ServiceError::validation(
                        "status",
                        format!("unknown quote status '{}'", target),
                    )
                })?;
                request_transition(document.quote_status(), requested)?.map(|s| s.as_str())
            }
        };

        let outcome = match applied {
            Some(new_status) => {
                sqlx::query(
                    "UPDATE documents SET status = $3, updated_utc = NOW() WHERE organization_id = $1 AND id = $2",
                )
                .bind(organization_id)
                .bind(document_id)
                .bind(new_status)
                .execute(&mut *tx)
                .await?;
                tx.commit().await?;

                info!(
                    document_id = %document_id,
                    from = %document.status,
                    to = new_status,
                    "Document status changed"
                );

                ChangeStatusOutcome {
                    status: new_status.to_string(),
                    changed: true,
                }
            }
            None => {
                tx.commit().await?;
                ChangeStatusOutcome {
                    status: document.status.clone(),
                    changed: false,
                }
            }
        };

        timer.observe_duration();

        Ok(outcome)
    }

    /// Flip a quote to ACCEPTED if it is in a state that allows it.
    ///
    /// Returns false when the quote exists but was not in SENT/ACCEPTED, or
    /// does not exist at all.
    pub(crate) async fn mark_quote_accepted(
        &self,
        organization_id: Uuid,
        quote_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET status = 'accepted', updated_utc = NOW()
            WHERE organization_id = $1 AND kind = 'quote' AND id = $2
              AND status IN ('sent', 'accepted')
            "#,
        )
        .bind(organization_id)
        .bind(quote_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Insert the computed line items of a document.
    async fn insert_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        organization_id: Uuid,
        document_id: Uuid,
        items: &[LineItemInput],
    ) -> Result<(), ServiceError> {
        for (idx, item) in items.iter().enumerate() {
            let amounts = money::compute_line(item.quantity, item.unit_price, item.tax_rate_percent);
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
            .bind(document_id)
            .bind(organization_id)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.tax_rate_percent)
            .bind(item.is_service)
            .bind(item.product_id)
            .bind(item.tax_rate_id)
            .bind(amounts.ht)
            .bind(amounts.tva)
            .bind(amounts.total)
            .bind(idx as i32)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

fn compute_totals(items: &[LineItemInput]) -> money::DocumentTotals {
    let lines: Vec<money::PricedLine> = items
        .iter()
        .map(|item| money::PricedLine {
            quantity: item.quantity,
            unit_price: item.unit_price,
            tax_rate_percent: item.tax_rate_percent,
        })
        .collect();
    money::compute_document(&lines)
}
