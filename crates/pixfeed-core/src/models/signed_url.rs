use super::ObjectKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access direction a signed URL was minted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Read,
    Write,
}

impl Direction {
    /// HTTP method the URL is signed for
    pub fn http_method(&self) -> &'static str {
        match self {
            Direction::Read => "GET",
            Direction::Write => "PUT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => write!(f, "read"),
            Direction::Write => write!(f, "write"),
        }
    }
}

/// Time-limited capability for one `{key, direction}` pair.
///
/// Not `Serialize`: a signed URL is handed to exactly one consumer and never
/// stored. `Debug` and `Display` print the URL without its query string so the
/// signature cannot leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedUrl {
    key: ObjectKey,
    direction: Direction,
    url: String,
    expires_at: DateTime<Utc>,
}

impl SignedUrl {
    pub fn new(
        key: ObjectKey,
        direction: Direction,
        url: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            direction,
            url: url.into(),
            expires_at,
        }
    }

    pub fn key(&self) -> &ObjectKey {
        &self.key
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Full URL including the signature
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn into_string(self) -> String {
        self.url
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// URL with the query string removed
    pub fn redacted(&self) -> &str {
        match self.url.find('?') {
            Some(idx) => &self.url[..idx],
            None => &self.url,
        }
    }
}

impl fmt::Debug for SignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedUrl")
            .field("key", &self.key.as_str())
            .field("direction", &self.direction)
            .field("url", &self.redacted())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl fmt::Display for SignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.redacted())
    }
}
