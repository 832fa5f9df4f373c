//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
};
use fabula_core::RequestContext;
use fabula_db::entities::member;

/// Authenticated member extractor.
#[derive(Debug, Clone)]
pub struct AuthMember(pub member::Model);

impl<S> FromRequestParts<S> for AuthMember
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get member from request extensions (set by auth middleware)
        parts
            .extensions
            .get::<member::Model>()
            .cloned()
            .map(AuthMember)
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

/// Optional authenticated member extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthMember(pub Option<member::Model>);

impl<S> FromRequestParts<S> for MaybeAuthMember
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<member::Model>().cloned()))
    }
}

/// Client metadata recorded on publishing audit entries.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl From<ClientMeta> for RequestContext {
    fn from(meta: ClientMeta) -> Self {
        Self {
            ip_address: meta.ip_address,
            user_agent: meta.user_agent,
        }
    }
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // First hop of x-forwarded-for is the originating client
        let ip_address = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_string());

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);

        Ok(Self {
            ip_address,
            user_agent,
        })
    }
}
