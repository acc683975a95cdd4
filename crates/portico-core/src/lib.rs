// ABOUTME: Core library for portico: session validation and failure normalization.
// ABOUTME: Framework-free; the server crate wires these into axum/tower layers.

pub mod failure;
pub mod log;
pub mod normalize;
pub mod session;

pub use failure::{AuthFailure, Failure};
pub use log::{FailureLog, LogMeta, LogRecord, RecordingLog, TracingLog, log_failure};
pub use normalize::{NormalizedError, Severity, normalize};
pub use session::{SESSION_HEADER, Session, is_truthy};
