//! Pixfeed Infrastructure Library
//!
//! Shared pieces used by both HTTP services (feed API and transform
//! service):
//! - Middleware (request ID)
//! - Telemetry initialization
//! - Error response body
//! - Graceful shutdown signal

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod error;
pub mod shutdown;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{request_id_middleware, RequestId, REQUEST_ID_HEADER};

#[cfg(feature = "observability-basic")]
pub use telemetry::init_telemetry;

pub use error::ErrorResponse;
pub use shutdown::shutdown_signal;
