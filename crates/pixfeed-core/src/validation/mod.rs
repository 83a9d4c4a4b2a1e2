//! Validation modules

pub mod key;

pub use key::{validate_object_key, MAX_OBJECT_KEY_LENGTH};
