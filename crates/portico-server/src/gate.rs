// ABOUTME: Session gate middleware: validates the `session` header before any handler runs.
// ABOUTME: Accepted sessions land in the RequestContext; rejections carry an AuthFailure.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::response::IntoResponse;
use futures::future::BoxFuture;
use portico_core::{AuthFailure, SESSION_HEADER, Session};
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::context::{RequestContext, raw_session_header};
use crate::error::ApiError;

/// A tower Layer that puts every wrapped route behind the session gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionGateLayer;

impl SessionGateLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for SessionGateLayer {
    type Service = SessionGate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionGate { inner }
    }
}

/// The middleware service that validates sessions. No per-route opt-out.
#[derive(Debug, Clone)]
pub struct SessionGate<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for SessionGate<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        match admit(&mut req) {
            Ok(()) => {
                let mut inner = self.inner.clone();
                Box::pin(async move { inner.call(req).await })
            }
            Err(failure) => {
                tracing::debug!(code = failure.code(), "session gate rejected request");
                Box::pin(async move { Ok(ApiError::from(failure).into_response()) })
            }
        }
    }
}

/// Validate the session header and record the result on the request.
fn admit(req: &mut Request<Body>) -> Result<(), AuthFailure> {
    let mut ctx = req
        .extensions_mut()
        .remove::<RequestContext>()
        .unwrap_or_else(|| RequestContext::from_headers(req.headers()));
    ctx.raw_session = raw_session_header(req.headers());

    // A header that exists but cannot be read as text cannot be JSON either.
    let present = req.headers().contains_key(SESSION_HEADER);
    let result = match (&ctx.raw_session, present) {
        (None, true) => Err(AuthFailure::SessionHeaderInvalid),
        (raw, _) => Session::from_header(raw.as_deref()),
    };

    let outcome = result.map(|session| {
        ctx.session = Some(session);
    });
    req.extensions_mut().insert(ctx);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CurrentSession;
    use axum::Json;
    use axum::Router;
    use axum::http::{HeaderValue, StatusCode};
    use axum::routing::get;
    use portico_core::Failure;
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new()
            .route(
                "/api/whoami",
                get(|CurrentSession(session): CurrentSession| async move {
                    Json(session.to_value())
                }),
            )
            .layer(SessionGateLayer::new())
    }

    fn failure_of(resp: Response<Body>) -> Option<Failure> {
        resp.extensions().get::<Failure>().cloned()
    }

    async fn call(header: Option<&[u8]>) -> Response<Body> {
        let mut builder = Request::get("/api/whoami");
        if let Some(value) = header {
            builder = builder.header("session", HeaderValue::from_bytes(value).unwrap());
        }
        test_router()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn gate_rejects_without_session() {
        let resp = call(None).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            failure_of(resp),
            Some(Failure::Auth(AuthFailure::SessionRequired))
        );
    }

    #[tokio::test]
    async fn gate_rejects_non_json_session() {
        let resp = call(Some(b"bad")).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            failure_of(resp),
            Some(Failure::Auth(AuthFailure::SessionHeaderInvalid))
        );
    }

    #[tokio::test]
    async fn gate_rejects_empty_session() {
        let resp = call(Some(b"")).await;

        assert_eq!(
            failure_of(resp),
            Some(Failure::Auth(AuthFailure::SessionHeaderInvalid))
        );
    }

    #[tokio::test]
    async fn gate_rejects_unreadable_session_bytes() {
        let resp = call(Some(&[0xc3, 0x28])).await;

        assert_eq!(
            failure_of(resp),
            Some(Failure::Auth(AuthFailure::SessionHeaderInvalid))
        );
    }

    #[tokio::test]
    async fn gate_rejects_session_without_user_id() {
        for raw in [
            &br#"{"noUserId":true}"#[..],
            &b"5"[..],
            &br#"{"userId":0}"#[..],
        ] {
            let resp = call(Some(raw)).await;

            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(
                failure_of(resp),
                Some(Failure::Auth(AuthFailure::SessionHeaderMissingUserId))
            );
        }
    }

    #[tokio::test]
    async fn gate_passes_parsed_session_to_handler() {
        let resp = call(Some(br#"{"userId":1,"name":"Bruce Wayne"}"#)).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "userId": 1, "name": "Bruce Wayne" })
        );
    }

    #[tokio::test]
    async fn gate_accepts_non_ascii_utf8_session() {
        let raw = r#"{"userId":1,"name":"Zoë"}"#;
        let resp = call(Some(raw.as_bytes())).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "userId": 1, "name": "Zoë" }));
    }

    #[tokio::test]
    async fn gate_records_raw_header_in_context() {
        let app = Router::new()
            .route(
                "/api/ctx",
                get(|ctx: RequestContext| async move {
                    Json(serde_json::json!({
                        "raw": ctx.raw_session,
                        "gated": ctx.session.is_some(),
                    }))
                }),
            )
            .layer(SessionGateLayer::new());

        let resp = app
            .oneshot(
                Request::get("/api/ctx")
                    .header("session", r#"{"userId":"a"}"#)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["raw"], r#"{"userId":"a"}"#);
        assert_eq!(json["gated"], true);
    }

    #[tokio::test]
    async fn gate_is_idempotent() {
        for _ in 0..3 {
            let resp = call(Some(b"bad")).await;
            assert_eq!(
                failure_of(resp),
                Some(Failure::Auth(AuthFailure::SessionHeaderInvalid))
            );
        }
    }
}
