// ABOUTME: Failure vocabulary shared by the session gate and the error interceptor.
// ABOUTME: A closed set of failure variants so normalization is an exhaustive match.

use serde_json::Value;
use thiserror::Error;

/// Reasons the session gate refuses a request. All map to HTTP 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("session header is required")]
    SessionRequired,

    #[error("session header is not valid JSON")]
    SessionHeaderInvalid,

    #[error("session header has no userId")]
    SessionHeaderMissingUserId,
}

impl AuthFailure {
    pub const fn status(self) -> u16 {
        401
    }

    /// Stable wire code for this failure.
    pub const fn code(self) -> &'static str {
        match self {
            Self::SessionRequired => "session-required",
            Self::SessionHeaderInvalid => "session-header-is-invalid",
            Self::SessionHeaderMissingUserId => "session-header-has-no-userId",
        }
    }
}

/// Any failure raised in the request pipeline.
///
/// Gate failures, handler failures and failures with no usable structure all
/// travel the same path to the error interceptor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Failure {
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    /// A failure declared by application code. Every field is optional;
    /// normalization fills in the gaps.
    #[error("{}", describe_handler(.code, .message, .status))]
    Handler {
        status: Option<u16>,
        code: Option<String>,
        message: Option<String>,
        context: Option<Value>,
    },

    /// A failure that carries nothing usable, such as a caught panic.
    #[error("unstructured failure")]
    Unstructured,
}

fn describe_handler(
    code: &Option<String>,
    message: &Option<String>,
    status: &Option<u16>,
) -> String {
    let label = code
        .as_deref()
        .or(message.as_deref())
        .unwrap_or("handler failure");
    match status {
        Some(status) => format!("{label} ({status})"),
        None => label.to_string(),
    }
}

impl Failure {
    /// An empty handler failure with no declared status, code or context.
    pub fn generic() -> Self {
        Self::Handler {
            status: None,
            code: None,
            message: None,
            context: None,
        }
    }

    /// A handler failure with a declared HTTP status.
    pub fn handler(status: u16) -> Self {
        Self::generic().with_status(status)
    }

    /// A handler failure described only by a message.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self::generic().with_message(message)
    }

    pub fn not_found() -> Self {
        Self::handler(404).with_code("not-found")
    }

    pub fn unstructured() -> Self {
        Self::Unstructured
    }

    pub fn with_status(self, status: u16) -> Self {
        self.map_handler(|s, _, _, _| *s = Some(status))
    }

    pub fn with_code(self, code: impl Into<String>) -> Self {
        let code = code.into();
        self.map_handler(|_, c, _, _| *c = Some(code))
    }

    pub fn with_message(self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.map_handler(|_, _, m, _| *m = Some(message))
    }

    /// Attach structured detail, e.g. a list of validation errors.
    pub fn with_context(self, context: Value) -> Self {
        self.map_handler(|_, _, _, c| *c = Some(context))
    }

    /// The declared status, if the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth(auth) => Some(auth.status()),
            Self::Handler { status, .. } => *status,
            Self::Unstructured => None,
        }
    }

    // Builders only touch Handler; auth and unstructured failures are fixed.
    fn map_handler(
        mut self,
        f: impl FnOnce(
            &mut Option<u16>,
            &mut Option<String>,
            &mut Option<String>,
            &mut Option<Value>,
        ),
    ) -> Self {
        if let Self::Handler {
            status,
            code,
            message,
            context,
        } = &mut self
        {
            f(status, code, message, context);
        }
        self
    }
}
