// ABOUTME: Maps any pipeline Failure onto the stable {code, status, context} wire shape.
// ABOUTME: Also picks the log severity for a failure from its status class.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::failure::Failure;

/// Code used when a failure declares neither a specific name nor a message.
pub const UNSPECIFIED_CODE: &str = "unspecified-error";

/// Status used when a failure does not declare a usable one.
pub const DEFAULT_STATUS: u16 = 500;

/// The client-visible body for every failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedError {
    pub code: String,
    pub status: u16,
    pub context: Map<String, Value>,
}

impl NormalizedError {
    /// The body used when nothing about the failure can be trusted.
    pub fn unspecified() -> Self {
        Self {
            code: UNSPECIFIED_CODE.to_string(),
            status: DEFAULT_STATUS,
            context: Map::new(),
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::for_status(self.status)
    }
}

/// Log severity selected for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client-caused failure (status below 500).
    Warn,
    /// Server-caused failure.
    Error,
}

impl Severity {
    pub fn for_status(status: u16) -> Self {
        if status < 500 { Self::Warn } else { Self::Error }
    }
}

/// Normalize a failure. Total: every variant maps to a body.
pub fn normalize(failure: &Failure) -> NormalizedError {
    match failure {
        Failure::Auth(auth) => NormalizedError {
            code: auth.code().to_string(),
            status: auth.status(),
            context: Map::new(),
        },
        Failure::Handler {
            status,
            code,
            message,
            context,
        } => NormalizedError {
            code: derive_code(code.as_deref(), message.as_deref()),
            status: status
                .filter(|s| is_http_status(*s))
                .unwrap_or(DEFAULT_STATUS),
            context: context.clone().map(into_context).unwrap_or_default(),
        },
        Failure::Unstructured => NormalizedError::unspecified(),
    }
}

/// Specific name first, then message, then the fixed fallback.
fn derive_code(code: Option<&str>, message: Option<&str>) -> String {
    code.filter(|c| !is_generic_name(c))
        .or_else(|| message.filter(|m| !m.is_empty()))
        .unwrap_or(UNSPECIFIED_CODE)
        .to_string()
}

// A bare "Error" name says nothing about what went wrong.
fn is_generic_name(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name.eq_ignore_ascii_case("error")
}

fn is_http_status(status: u16) -> bool {
    (100..=999).contains(&status)
}

// The wire context is always an object; anything else is wrapped.
fn into_context(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("detail".to_string(), other);
            map
        }
    }
}
