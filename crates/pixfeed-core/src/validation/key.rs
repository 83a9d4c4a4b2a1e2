//! Object key validation
//!
//! Keys address objects inside the bucket. They are supplied by callers and
//! must never be able to escape the bucket root or smuggle control bytes into
//! a signed URL.

/// Maximum key length in bytes (S3 limit).
pub const MAX_OBJECT_KEY_LENGTH: usize = 1024;

/// Validate an object key, returning a human readable reason on rejection.
pub fn validate_object_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("key is empty".to_string());
    }

    if key.len() > MAX_OBJECT_KEY_LENGTH {
        return Err(format!(
            "key is too long ({} bytes, max {})",
            key.len(),
            MAX_OBJECT_KEY_LENGTH
        ));
    }

    if key.starts_with('/') {
        return Err("key must not start with '/'".to_string());
    }

    if key.contains('\\') {
        return Err("key must not contain '\\'".to_string());
    }

    if key.chars().any(|c| c.is_control()) {
        return Err("key must not contain control characters".to_string());
    }

    for segment in key.split('/') {
        if segment.is_empty() {
            return Err("key must not contain empty path segments".to_string());
        }
        if segment == ".." || segment == "." {
            return Err("key must not contain relative path segments".to_string());
        }
    }

    Ok(())
}
