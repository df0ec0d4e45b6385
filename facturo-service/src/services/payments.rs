//! Payment reconciliation: applying a payment derives the invoice status
//! from the running paid total; deleting one rolls the status back.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::money::payment_tolerance;
use crate::domain::status::{
    DocumentKind, InvoiceStatus, status_after_payment, status_after_payment_removal,
};
use crate::error::ServiceError;
use crate::models::{Payment, PaymentInput};
use crate::services::database::Database;
use crate::services::metrics::{DB_QUERY_DURATION, PAYMENTS_TOTAL, PAYMENT_AMOUNT_TOTAL};

/// Result of applying a payment.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub payment_id: Uuid,
    pub new_status: InvoiceStatus,
    pub paid_total: Decimal,
}

/// Result of removing a payment.
#[derive(Debug, Clone)]
pub struct PaymentRemovalOutcome {
    pub invoice_id: Uuid,
    pub new_status: InvoiceStatus,
}

impl Database {
    /// Apply a payment against an invoice and derive its new status.
    #[instrument(skip(self, input), fields(organization_id = %organization_id, invoice_id = %invoice_id))]
    pub async fn apply_payment(
        &self,
        organization_id: Uuid,
        invoice_id: Uuid,
        input: &PaymentInput,
    ) -> Result<PaymentOutcome, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["apply_payment"])
            .start_timer();

        let mut tx = self.pool.begin().await?;

        let invoice = self
            .lock_document(&mut tx, organization_id, DocumentKind::Invoice, invoice_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let current = invoice.invoice_status();
        if matches!(current, InvoiceStatus::Paid | InvoiceStatus::Cancelled) {
            return Err(ServiceError::InvoiceClosed);
        }

        let prior_paid: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_one(&mut *tx)
        .await?;

        let remaining = invoice.total - prior_paid;
        if input.amount > remaining + payment_tolerance() {
            return Err(ServiceError::AmountExceedsBalance);
        }

        let payment_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO payments (id, invoice_id, organization_id, amount, method, paid_at, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(payment_id)
        .bind(invoice_id)
        .bind(organization_id)
        .bind(input.amount)
        .bind(input.method.as_str())
        .bind(input.paid_at)
        .bind(&input.note)
        .execute(&mut *tx)
        .await?;

        let paid_total = prior_paid + input.amount;
        let new_status = status_after_payment(current, invoice.total, paid_total);
        if new_status != current {
            sqlx::query(
                "UPDATE documents SET status = $3, updated_utc = NOW() WHERE organization_id = $1 AND id = $2",
            )
            .bind(organization_id)
            .bind(invoice_id)
            .bind(new_status.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        timer.observe_duration();
        PAYMENTS_TOTAL
            .with_label_values(&[input.method.as_str()])
            .inc();
        PAYMENT_AMOUNT_TOTAL
            .with_label_values(&[&invoice.currency_code])
            .inc_by(input.amount.to_f64().unwrap_or(0.0));

        info!(
            payment_id = %payment_id,
            invoice_id = %invoice_id,
            amount = %input.amount,
            new_status = new_status.as_str(),
            "Payment applied"
        );

        Ok(PaymentOutcome {
            payment_id,
            new_status,
            paid_total,
        })
    }

    /// Delete a payment and roll the invoice status back.
    ///
    /// When no payments remain, PAID and PARTIAL revert to SENT; any other
    /// status is left untouched, so an invoice that was OVERDUE before the
    /// payment does not get OVERDUE back through this path.
    #[instrument(skip(self), fields(organization_id = %organization_id, payment_id = %payment_id))]
    pub async fn remove_payment(
        &self,
        organization_id: Uuid,
        payment_id: Uuid,
    ) -> Result<PaymentRemovalOutcome, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["remove_payment"])
            .start_timer();

        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, invoice_id, organization_id, amount, method, paid_at, note, created_utc
            FROM payments
            WHERE organization_id = $1 AND id = $2
            "#,
        )
        .bind(organization_id)
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::NotFound)?;

        let invoice = self
            .lock_document(
                &mut tx,
                organization_id,
                DocumentKind::Invoice,
                payment.invoice_id,
            )
            .await?
            .ok_or(ServiceError::NotFound)?;

        sqlx::query("DELETE FROM payments WHERE organization_id = $1 AND id = $2")
            .bind(organization_id)
            .bind(payment_id)
            .execute(&mut *tx)
            .await?;

        let remaining_paid: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE invoice_id = $1",
        )
        .bind(payment.invoice_id)
        .fetch_one(&mut *tx)
        .await?;

        let current = invoice.invoice_status();
        let new_status = status_after_payment_removal(current, invoice.total, remaining_paid);
        if new_status != current {
            sqlx::query(
                "UPDATE documents SET status = $3, updated_utc = NOW() WHERE organization_id = $1 AND id = $2",
            )
            .bind(organization_id)
            .bind(payment.invoice_id)
            .bind(new_status.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        timer.observe_duration();

        info!(
            payment_id = %payment_id,
            invoice_id = %payment.invoice_id,
            new_status = new_status.as_str(),
            "Payment removed"
        );

        Ok(PaymentRemovalOutcome {
            invoice_id: payment.invoice_id,
            new_status,
        })
    }
}
