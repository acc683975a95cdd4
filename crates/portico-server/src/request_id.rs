// ABOUTME: Request correlation ids: ULID generation for tower-http's request-id layers.
// ABOUTME: Inbound x-request-id values are kept; missing ones get a fresh ULID.

use axum::http::{HeaderMap, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use ulid::Ulid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generates a ULID for every request that arrives without an id.
#[derive(Debug, Clone, Copy, Default)]
pub struct UlidRequestId;

impl MakeRequestId for UlidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Ulid::new().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request id carried in `headers`, if present and non-empty.
pub fn request_id_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}
