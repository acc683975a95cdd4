// ABOUTME: Session header parsing and validation for the portico session gate.
// ABOUTME: Classifies a raw `session` header value into a Session or an AuthFailure.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::failure::AuthFailure;

/// Name of the request header that carries the JSON-encoded session.
pub const SESSION_HEADER: &str = "session";

/// Field that must be present and truthy for a session to be accepted.
pub const USER_ID_FIELD: &str = "userId";

/// A validated, caller-supplied session object.
///
/// The gate only checks for a truthy `userId`; everything else in the object
/// is passed through to handlers untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Session(Map<String, Value>);

impl Session {
    /// Classify a raw header value.
    ///
    /// - `None` yields `SessionRequired`.
    /// - Text that is not valid JSON (including the empty string) yields
    ///   `SessionHeaderInvalid`.
    /// - JSON without a truthy `userId` (primitives, arrays, objects where
    ///   `userId` is missing, `0`, `false`, `""` or `null`) yields
    ///   `SessionHeaderMissingUserId`.
    pub fn from_header(raw: Option<&str>) -> Result<Self, AuthFailure> {
        let raw = raw.ok_or(AuthFailure::SessionRequired)?;

        let value: Value =
            serde_json::from_str(raw).map_err(|_| AuthFailure::SessionHeaderInvalid)?;

        match value {
            Value::Object(map) if map.get(USER_ID_FIELD).is_some_and(is_truthy) => Ok(Self(map)),
            _ => Err(AuthFailure::SessionHeaderMissingUserId),
        }
    }

    /// The session's `userId` value. Always truthy.
    pub fn user_id(&self) -> &Value {
        // from_header only builds sessions whose userId is present
        self.0.get(USER_ID_FIELD).unwrap_or(&Value::Null)
    }

    /// Look up an arbitrary field of the session object.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Clone the session back into a plain JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// JSON truthiness: `null`, `false`, zero and the empty string are falsy,
/// every other value (including empty arrays and objects) is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
