//! Typed request context
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! organization as the `X-Organization-Id` header.

use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

pub const ORGANIZATION_HEADER: &str = "x-organization-id";

/// Organization on whose behalf the request is made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrganizationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for OrganizationId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ORGANIZATION_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("missing organization".to_string()))?;

        raw.to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(OrganizationId)
            .ok_or_else(|| ApiError::Unauthorized("invalid organization id".to_string()))
    }
}
