//! Tenant context extractor for multi-tenant request scoping.
//!
//! The organization id comes from the `X-Org-ID` header, set by the BFF after
//! authenticating the user and validating their membership. Every data access
//! downstream is scoped by this id.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;

/// Organization scope extracted from request headers.
#[derive(Debug, Clone, Copy)]
pub struct OrgContext {
    pub organization_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for OrgContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("X-Org-ID")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::AuthError(anyhow::anyhow!("Missing X-Org-ID header (required from BFF)"))
            })?;

        let organization_id = Uuid::parse_str(raw).map_err(|_| {
            AppError::AuthError(anyhow::anyhow!("X-Org-ID header is not a valid UUID"))
        })?;

        let span = tracing::Span::current();
        span.record("organization_id", raw);

        Ok(OrgContext { organization_id })
    }
}
