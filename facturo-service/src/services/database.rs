//! Database service for facturo-service: pool management, projections, and
//! the transactional helpers shared by the mutation operations.

use sqlx::postgres::{PgPool, PgPoolOptions, Postgres};
use sqlx::Transaction;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::status::DocumentKind;
use crate::error::ServiceError;
use crate::models::{Document, DocumentItem, ListDocumentsFilter, NewClient, Payment};
use crate::services::metrics::DB_QUERY_DURATION;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pub(crate) pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "facturo-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, ServiceError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| ServiceError::Transaction(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), ServiceError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ServiceError::Transaction(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Projections
    // -------------------------------------------------------------------------

    /// Get a document by ID.
    #[instrument(skip(self), fields(organization_id = %organization_id, document_id = %document_id))]
    pub async fn get_document(
        &self,
        organization_id: Uuid,
        kind: DocumentKind,
        document_id: Uuid,
    ) -> Result<Option<Document>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_document"])
            .start_timer();

        let document = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, organization_id, kind, number, client_id, status,
                issue_date, due_date, expiry_date, currency_code, exchange_rate,
                subtotal, tax_total, total, notes, terms, internal_notes,
                origin_quote_id, created_utc, updated_utc
            FROM documents
            WHERE organization_id = $1 AND kind = $2 AND id = $3
            "#,
        )
        .bind(organization_id)
        .bind(kind.as_str())
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;

        timer.observe_duration();

        Ok(document)
    }

    /// Get the line items of a document, in display order.
    #[instrument(skip(self), fields(organization_id = %organization_id, document_id = %document_id))]
    pub async fn get_document_items(
        &self,
        organization_id: Uuid,
        document_id: Uuid,
    ) -> Result<Vec<DocumentItem>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_document_items"])
            .start_timer();

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
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        timer.observe_duration();

        Ok(items)
    }

    /// List documents of one kind for an organization.
    #[instrument(skip(self, filter), fields(organization_id = %organization_id))]
    pub async fn list_documents(
        &self,
        organization_id: Uuid,
        kind: DocumentKind,
        filter: &ListDocumentsFilter,
    ) -> Result<Vec<Document>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_documents"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;

        let documents = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, Document>(
                r#"
                SELECT id, organization_id, kind, number, client_id, status,
                    issue_date, due_date, expiry_date, currency_code, exchange_rate,
                    subtotal, tax_total, total, notes, terms, internal_notes,
                    origin_quote_id, created_utc, updated_utc
                FROM documents
                WHERE organization_id = $1
                  AND kind = $2
                  AND ($3::varchar IS NULL OR status = $3)
                  AND ($4::uuid IS NULL OR client_id = $4)
                  AND id > $5
                ORDER BY id
                LIMIT $6
                "#,
            )
            .bind(organization_id)
            .bind(kind.as_str())
            .bind(&filter.status)
            .bind(filter.client_id)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Document>(
                r#"
                SELECT id, organization_id, kind, number, client_id, status,
                    issue_date, due_date, expiry_date, currency_code, exchange_rate,
                    subtotal, tax_total, total, notes, terms, internal_notes,
                    origin_quote_id, created_utc, updated_utc
                FROM documents
                WHERE organization_id = $1
                  AND kind = $2
                  AND ($3::varchar IS NULL OR status = $3)
                  AND ($4::uuid IS NULL OR client_id = $4)
                ORDER BY id
                LIMIT $5
                "#,
            )
            .bind(organization_id)
            .bind(kind.as_str())
            .bind(&filter.status)
            .bind(filter.client_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }?;

        timer.observe_duration();

        Ok(documents)
    }

    /// List the payments applied to an invoice.
    #[instrument(skip(self), fields(organization_id = %organization_id, invoice_id = %invoice_id))]
    pub async fn list_payments(
        &self,
        organization_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Vec<Payment>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_payments"])
            .start_timer();

        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, invoice_id, organization_id, amount, method, paid_at, note, created_utc
            FROM payments
            WHERE organization_id = $1 AND invoice_id = $2
            ORDER BY paid_at, created_utc
            "#,
        )
        .bind(organization_id)
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        timer.observe_duration();

        Ok(payments)
    }

    // -------------------------------------------------------------------------
    // Transactional helpers
    // -------------------------------------------------------------------------

    /// Fetch a document inside a transaction, taking a row lock.
    pub(crate) async fn lock_document(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        organization_id: Uuid,
        kind: DocumentKind,
        document_id: Uuid,
    ) -> Result<Option<Document>, ServiceError> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, organization_id, kind, number, client_id, status,
                issue_date, due_date, expiry_date, currency_code, exchange_rate,
                subtotal, tax_total, total, notes, terms, internal_notes,
                origin_quote_id, created_utc, updated_utc
            FROM documents
            WHERE organization_id = $1 AND kind = $2 AND id = $3
            FOR UPDATE
            "#,
        )
        .bind(organization_id)
        .bind(kind.as_str())
        .bind(document_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(document)
    }

    /// Allocate the next sequence value for (organization, kind, year).
    ///
    /// The counter row is upserted with an atomic increment so concurrent
    /// creates never observe the same value.
    pub(crate) async fn next_document_seq(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        organization_id: Uuid,
        kind: DocumentKind,
        year: i32,
    ) -> Result<i64, ServiceError> {
        let seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO document_counters (organization_id, kind, year, next_seq)
            VALUES ($1, $2, $3, 2)
            ON CONFLICT (organization_id, kind, year)
            DO UPDATE SET next_seq = document_counters.next_seq + 1
            RETURNING next_seq - 1
            "#,
        )
        .bind(organization_id)
        .bind(kind.as_str())
        .bind(year)
        .fetch_one(&mut **tx)
        .await?;

        Ok(seq)
    }

    /// Create a client inline, within the caller's transaction.
    pub(crate) async fn insert_client(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        organization_id: Uuid,
        input: &NewClient,
    ) -> Result<Uuid, ServiceError> {
        let client_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO clients (id, organization_id, client_type, name, email, phone, address, tax_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(client_id)
        .bind(organization_id)
        .bind(input.client_type.as_str())
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.tax_id)
        .execute(&mut **tx)
        .await?;

        info!(client_id = %client_id, "Inline client created");

        Ok(client_id)
    }
}
