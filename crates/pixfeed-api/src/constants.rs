//! API route constants

/// Feed routes live under this prefix
pub const FEED_PREFIX: &str = "/api/v0/feed";

/// Signed media routes (local storage backend only)
pub const MEDIA_PREFIX: &str = "/media";

/// Largest body accepted on a signed media PUT
pub const MAX_MEDIA_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Largest JSON body accepted on feed routes
pub const MAX_JSON_BODY_BYTES: usize = 64 * 1024;
