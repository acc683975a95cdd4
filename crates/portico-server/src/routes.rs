// ABOUTME: Route definitions and handler functions for the bundled portico service.
// ABOUTME: Public health check plus session-gated endpoints that exercise the pipeline.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use portico_core::{Failure, FailureLog};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::context::{CurrentSession, RequestContext};
use crate::error::ApiError;
use crate::pipeline::Pipeline;

/// Build the complete router: the demo routes wrapped in the pipeline.
pub fn create_router(log: Arc<dyn FailureLog>) -> Router {
    Pipeline::new(log)
        .public(Router::new().route("/health", get(health)))
        .protected(
            Router::new()
                .route("/api/whoami", get(whoami))
                .route("/api/echo", post(echo))
                .route("/api/fail", get(fail)),
        )
        .build()
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/whoami - Return the session the gate accepted.
async fn whoami(ctx: RequestContext, CurrentSession(session): CurrentSession) -> Json<Value> {
    Json(json!({
        "session": session,
        "requestId": ctx.request_id,
    }))
}

/// Request body for the echo endpoint.
#[derive(Debug, Deserialize)]
pub struct EchoRequest {
    pub message: Option<String>,
}

/// POST /api/echo - Echo a message back, attributed to the session's user.
async fn echo(
    CurrentSession(session): CurrentSession,
    payload: Result<Json<EchoRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;

    let message = req
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| {
            Failure::handler(422)
                .with_code("validation-failed")
                .with_context(json!({
                    "errors": [{ "field": "message", "reason": "required" }]
                }))
        })?;

    Ok(Json(json!({
        "userId": session.user_id(),
        "message": message,
    })))
}

/// GET /api/fail - Fail without declaring a status or a code.
async fn fail() -> Result<Json<Value>, ApiError> {
    Err(Failure::generic().into())
}
