// ABOUTME: End-to-end smoke tests for the portico request pipeline.
// ABOUTME: Drives the bundled router through every session outcome and the generic failure path.

use std::sync::Arc;

use axum::body::Body;
use http::Request;
use portico_core::{RecordingLog, Severity};
use portico_server::create_router;
use tower::ServiceExt;

/// Helper to extract JSON body from a response.
async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Send GET `path` with an optional session header through a fresh router.
async fn get(
    log: &Arc<RecordingLog>,
    path: &str,
    session: Option<&str>,
) -> axum::response::Response {
    let app = create_router(Arc::clone(log) as Arc<dyn portico_core::FailureLog>);
    let mut req = Request::get(path);
    if let Some(session) = session {
        req = req.header("session", session);
    }
    app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
}

#[tokio::test]
async fn missing_session_is_rejected() {
    let log = Arc::new(RecordingLog::new());
    let resp = get(&log, "/api/whoami", None).await;

    assert_eq!(resp.status(), 401);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/json"
    );
    let json = json_body(resp).await;
    assert_eq!(
        json,
        serde_json::json!({ "code": "session-required", "status": 401, "context": {} })
    );
}

#[tokio::test]
async fn non_json_session_is_rejected() {
    let log = Arc::new(RecordingLog::new());
    let resp = get(&log, "/api/whoami", Some("bad")).await;

    assert_eq!(resp.status(), 401);
    assert_eq!(json_body(resp).await["code"], "session-header-is-invalid");
}

#[tokio::test]
async fn session_without_user_id_is_rejected() {
    let log = Arc::new(RecordingLog::new());
    let resp = get(&log, "/api/whoami", Some(r#"{"noUserId":true}"#)).await;

    assert_eq!(resp.status(), 401);
    assert_eq!(json_body(resp).await["code"], "session-header-has-no-userId");
}

#[tokio::test]
async fn zero_user_id_is_rejected() {
    let log = Arc::new(RecordingLog::new());
    let resp = get(&log, "/api/whoami", Some(r#"{"userId":0}"#)).await;

    assert_eq!(resp.status(), 401);
    assert_eq!(json_body(resp).await["code"], "session-header-has-no-userId");
}

#[tokio::test]
async fn valid_session_reaches_handler() {
    let log = Arc::new(RecordingLog::new());
    let resp = get(
        &log,
        "/api/whoami",
        Some(r#"{"userId":1,"name":"Bruce Wayne"}"#),
    )
    .await;

    assert_eq!(resp.status(), 200);
    let json = json_body(resp).await;
    assert_eq!(
        json["session"],
        serde_json::json!({ "userId": 1, "name": "Bruce Wayne" })
    );
    assert!(log.records().is_empty(), "success must not log a failure");
}

#[tokio::test]
async fn generic_handler_failure_is_unspecified_500() {
    let log = Arc::new(RecordingLog::new());
    let resp = get(&log, "/api/fail", Some(r#"{"userId":1}"#)).await;

    assert_eq!(resp.status(), 500);
    assert_eq!(
        json_body(resp).await,
        serde_json::json!({ "code": "unspecified-error", "status": 500, "context": {} })
    );
}

#[tokio::test]
async fn severity_follows_status_class() {
    let log = Arc::new(RecordingLog::new());

    let _ = get(&log, "/api/whoami", None).await;
    let _ = get(&log, "/api/fail", Some(r#"{"userId":1}"#)).await;

    let records = log.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].severity, Severity::Warn);
    assert_eq!(records[0].meta.status, 401);
    assert_eq!(records[1].severity, Severity::Error);
    assert_eq!(records[1].meta.status, 500);
    assert!(records.iter().all(|r| r.meta.request_id.is_some()));
}

#[tokio::test]
async fn repeated_requests_classify_identically() {
    let log = Arc::new(RecordingLog::new());

    for _ in 0..3 {
        let resp = get(&log, "/api/whoami", Some("{\"userId\":")).await;
        assert_eq!(resp.status(), 401);
        assert_eq!(json_body(resp).await["code"], "session-header-is-invalid");
    }
}
