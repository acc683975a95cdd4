// ABOUTME: Error interceptor: rewrites every failed response into {code, status, context} JSON.
// ABOUTME: Logs each failure through the injected FailureLog at a severity set by status class.

use std::any::Any;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::Json;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use futures::future::BoxFuture;
use portico_core::{Failure, FailureLog, LogMeta, NormalizedError, log_failure, normalize};
use tower::{Layer, Service};

use crate::error::ApiError;
use crate::request_id::request_id_of;

/// A tower Layer that normalizes failures from everything it wraps.
#[derive(Clone)]
pub struct ErrorInterceptLayer {
    log: Arc<dyn FailureLog>,
}

impl ErrorInterceptLayer {
    /// Create the layer with the sink that receives failure log entries.
    pub fn new(log: Arc<dyn FailureLog>) -> Self {
        Self { log }
    }
}

impl<S> Layer<S> for ErrorInterceptLayer {
    type Service = ErrorIntercept<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorIntercept {
            inner,
            log: Arc::clone(&self.log),
        }
    }
}

/// The middleware service behind [`ErrorInterceptLayer`].
#[derive(Clone)]
pub struct ErrorIntercept<S> {
    inner: S,
    log: Arc<dyn FailureLog>,
}

impl<S> Service<Request<Body>> for ErrorIntercept<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let request_id = request_id_of(req.headers());
        let log = Arc::clone(&self.log);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;
            Ok(intercept(response, request_id, log.as_ref()))
        })
    }
}

/// Replace a failed response with its normalized body and log it.
///
/// Responses that carry a [`Failure`] extension are normalized from it.
/// Any other 4xx/5xx response, whether built by the framework (405, 413,
/// ...) or by a handler, is normalized from its status and its body is
/// discarded. Everything else passes through.
pub fn intercept(
    mut response: Response<Body>,
    request_id: Option<String>,
    log: &dyn FailureLog,
) -> Response<Body> {
    let failure = match response.extensions_mut().remove::<Failure>() {
        Some(failure) => failure,
        None => match status_failure(&response) {
            Some(failure) => failure,
            None => return response,
        },
    };

    let error = normalize(&failure);
    let reply = render(&error);

    // Body and status are fixed before the entry is handed to the sink.
    log_failure(
        log,
        error.severity(),
        &failure.to_string(),
        &LogMeta::from_error(request_id, &error),
    );
    reply
}

/// Serialize a normalized error as the JSON response.
pub fn render(error: &NormalizedError) -> Response<Body> {
    let status = StatusCode::from_u16(error.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(error)).into_response()
}

fn status_failure(response: &Response<Body>) -> Option<Failure> {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return None;
    }

    let failure = Failure::handler(status.as_u16());
    Some(match status.canonical_reason() {
        Some(reason) => failure.with_code(reason_code(reason)),
        None => failure,
    })
}

// "Method Not Allowed" -> "method-not-allowed"
fn reason_code(reason: &str) -> String {
    reason
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Response for a handler panic, for use with `tower_http::catch_panic`.
///
/// The payload is dropped; clients only ever see `unspecified-error`.
pub fn panic_failure(_payload: Box<dyn Any + Send + 'static>) -> Response<Body> {
    ApiError::from(Failure::unstructured()).into_response()
}
