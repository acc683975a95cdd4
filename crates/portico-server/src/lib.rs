// ABOUTME: HTTP wiring for portico: session gate, error interceptor, and request pipeline.
// ABOUTME: Uses Axum and tower layers around the framework-free portico-core.

pub mod config;
pub mod context;
pub mod error;
pub mod gate;
pub mod intercept;
pub mod pipeline;
pub mod request_id;
pub mod routes;
pub mod serve;

pub use config::{ConfigError, LogFormat, ServerConfig};
pub use context::{CurrentSession, RequestContext};
pub use error::ApiError;
pub use gate::SessionGateLayer;
pub use intercept::ErrorInterceptLayer;
pub use pipeline::Pipeline;
pub use routes::create_router;
pub use serve::serve;
