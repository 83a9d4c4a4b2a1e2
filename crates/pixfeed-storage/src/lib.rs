//! Pixfeed Storage Library
//!
//! Signed URL minting and object writes for Pixfeed. The relay never holds
//! storage credentials beyond what its `SignedUrlProvider` needs: reads and
//! writes both go through short-lived URLs.
//!
//! # Backends
//!
//! - **s3**: presigned URLs from `object_store`'s AWS signer
//! - **local**: HMAC-signed URLs served by the API's `/media` routes, backed
//!   by a filesystem root
//!
//! Keys are validated by [`pixfeed_core::ObjectKey`] before they reach any
//! backend.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;
pub mod upload;

// Re-export commonly used types
pub use factory::create_signer;
#[cfg(feature = "storage-local")]
pub use factory::{create_local_media, LocalMedia};
#[cfg(feature = "storage-local")]
pub use local::{LocalObjectStore, LocalUrlSigner};
pub use pixfeed_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3UrlSigner;
pub use traits::{ObjectUploader, SignedUrlProvider, StorageError, StorageResult};
pub use upload::HttpUploader;
