//! Pixfeed API Library
//!
//! This crate provides the HTTP handlers, error mapping and application
//! setup for the feed API. Handlers stay thin: persistence goes through
//! `FeedItemStore` and every image operation through `TransformRelay`.

pub mod constants;
pub mod error;
mod handlers;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{HttpAppError, ValidatedJson};
pub use pixfeed_infra::ErrorResponse;
pub use state::AppState;
