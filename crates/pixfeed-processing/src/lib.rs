//! Pixfeed Processing Library
//!
//! Image filters run by the transform service. Everything happens in
//! memory; nothing is written to disk.

pub mod error;
#[cfg(feature = "image")]
pub mod grayscale;

pub use error::{ProcessingError, ProcessingResult};
#[cfg(feature = "image")]
pub use grayscale::{GrayscaleThumbnail, OUTPUT_CONTENT_TYPE};
