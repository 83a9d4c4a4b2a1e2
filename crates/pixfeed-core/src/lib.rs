//! Pixfeed Core Library
//!
//! This crate provides the domain types, error taxonomy, configuration and key
//! validation shared by the storage, relay, HTTP and CLI crates.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, FilterServiceConfig, PixfeedConfig};
pub use error::{AppError, ErrorMetadata, LogLevel, RelayError};
pub use models::{
    Direction, FeedPost, FinalRef, ObjectKey, SignedUrl, TransformResult,
};
pub use storage_types::StorageBackend;
pub use validation::validate_object_key;
