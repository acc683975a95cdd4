// ABOUTME: Pipeline builder that assembles the fixed middleware order around application routes.
// ABOUTME: request id -> trace -> error interceptor -> panic catcher -> session gate -> handler.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use portico_core::{Failure, FailureLog};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::gate::SessionGateLayer;
use crate::intercept::{ErrorInterceptLayer, panic_failure};
use crate::request_id::{UlidRequestId, request_id_of};

/// Builds the request pipeline. The layer order is owned here and cannot be
/// rearranged by callers; they only choose which routes sit behind the gate.
pub struct Pipeline {
    log: Arc<dyn FailureLog>,
    protected: Router,
    has_protected: bool,
    public: Router,
}

impl Pipeline {
    /// Start a pipeline whose failures are logged to `log`.
    pub fn new(log: Arc<dyn FailureLog>) -> Self {
        Self {
            log,
            protected: Router::new(),
            has_protected: false,
            public: Router::new(),
        }
    }

    /// Add routes that require a valid session.
    pub fn protected(mut self, routes: Router) -> Self {
        self.protected = self.protected.merge(routes);
        self.has_protected = true;
        self
    }

    /// Add routes that bypass the session gate. Handlers here that care
    /// about the session read the raw header from `RequestContext`.
    pub fn public(mut self, routes: Router) -> Self {
        self.public = self.public.merge(routes);
        self
    }

    pub fn build(self) -> Router {
        // route_layer on a router without routes panics
        let protected = if self.has_protected {
            self.protected.route_layer(SessionGateLayer::new())
        } else {
            self.protected
        };

        Router::new()
            .merge(self.public)
            .merge(protected)
            .fallback(not_found)
            .layer(CatchPanicLayer::custom(panic_failure))
            .layer(ErrorInterceptLayer::new(self.log))
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id = request_id_of(req.headers()).as_deref().unwrap_or("-"),
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UlidRequestId))
    }
}

async fn not_found() -> ApiError {
    Failure::not_found().into()
}
