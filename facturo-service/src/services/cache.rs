//! Cache invalidation sink.
//!
//! After every successful mutation the service emits one invalidation signal
//! keyed by (organization, kind, document id). The external caching layer
//! consumes the signal; the service only guarantees it fires exactly once per
//! mutation and never fails the request over it.

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::warn;
use uuid::Uuid;

use crate::domain::status::DocumentKind;

#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, organization_id: Uuid, kind: DocumentKind, document_id: Uuid);
}

/// Redis-backed invalidator: deletes the per-document key and the per-kind
/// listing key for the organization.
pub struct RedisInvalidator {
    client: redis::Client,
}

impl RedisInvalidator {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn try_invalidate(
        &self,
        organization_id: Uuid,
        kind: DocumentKind,
        document_id: Uuid,
    ) -> redis::RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let keys = [
            format!("facturo:{}:{}", organization_id, kind.as_str()),
            format!("facturo:{}:{}:{}", organization_id, kind.as_str(), document_id),
        ];
        let _: i64 = conn.del(&keys).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheInvalidator for RedisInvalidator {
    async fn invalidate(&self, organization_id: Uuid, kind: DocumentKind, document_id: Uuid) {
        if let Err(e) = self
            .try_invalidate(organization_id, kind, document_id)
            .await
        {
            warn!(
                organization_id = %organization_id,
                document_id = %document_id,
                error = %e,
                "Cache invalidation failed"
            );
        }
    }
}

/// Invalidator that drops the signal. Used when no Redis is configured and in
/// tests.
pub struct NoopInvalidator;

#[async_trait]
impl CacheInvalidator for NoopInvalidator {
    async fn invalidate(&self, _organization_id: Uuid, _kind: DocumentKind, _document_id: Uuid) {}
}
