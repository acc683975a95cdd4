// ABOUTME: Per-request context populated by the session gate and read by handlers.
// ABOUTME: Provides axum extractors for the request context and the validated session.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use portico_core::{AuthFailure, SESSION_HEADER, Session};

use crate::error::ApiError;
use crate::request_id::request_id_of;

/// State attached to a single request as it moves through the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    /// Correlation id, echoed in the `x-request-id` response header.
    pub request_id: Option<String>,
    /// The `session` header as received, if it could be read as text.
    pub raw_session: Option<String>,
    /// Set once the gate has accepted the session.
    pub session: Option<Session>,
}

impl RequestContext {
    /// Build a context from request headers, before any validation.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            request_id: request_id_of(headers),
            raw_session: raw_session_header(headers),
            session: None,
        }
    }
}

/// Read the `session` header as text. Values that are not valid UTF-8
/// are treated as unreadable.
pub fn raw_session_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
        .map(|v| v.to_string())
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Routes outside the gate get a context derived from the headers.
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::from_headers(&parts.headers)))
    }
}

/// Extractor for the session accepted by the gate.
///
/// Used on a route that is not behind the gate, it rejects with
/// `session-required`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.session.clone())
            .map(CurrentSession)
            .ok_or_else(|| AuthFailure::SessionRequired.into())
    }
}
