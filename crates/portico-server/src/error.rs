// ABOUTME: Handler-facing error type that carries a core Failure to the error interceptor.
// ABOUTME: Responses built from ApiError hold the Failure in their extensions for normalization.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use portico_core::{AuthFailure, Failure};
use serde_json::json;

/// Error returned by handlers, extractors and the session gate.
///
/// Its response has no body of its own; the error interceptor replaces it
/// with the normalized `{code, status, context}` body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError(pub Failure);

impl ApiError {
    pub fn failure(&self) -> &Failure {
        &self.0
    }

    pub fn into_failure(self) -> Failure {
        self.0
    }
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        Self(failure)
    }
}

impl From<AuthFailure> for ApiError {
    fn from(failure: AuthFailure) -> Self {
        Self(failure.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(
            Failure::handler(rejection.status().as_u16())
                .with_code("invalid-request-body")
                .with_context(json!({ "message": rejection.body_text() })),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self
            .0
            .status()
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = status.into_response();
        response.extensions_mut().insert(self.0);
        response
    }
}
