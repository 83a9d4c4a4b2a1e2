use super::{ObjectKey, SignedUrl};
use bytes::Bytes;
use std::fmt;

/// Bytes and declared type returned by the transform service.
///
/// `content_type` is the upstream header verbatim; the upload reuses it so the
/// stored object's declared type matches its encoding.
#[derive(Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub bytes: Bytes,
    pub content_type: String,
}

impl TransformResult {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for TransformResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformResult")
            .field("size_bytes", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Outcome of a successful relay invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalRef {
    url: SignedUrl,
    transformed: bool,
}

impl FinalRef {
    pub fn new(url: SignedUrl, transformed: bool) -> Self {
        Self { url, transformed }
    }

    /// Key of the object the reference resolves to
    pub fn key(&self) -> &ObjectKey {
        self.url.key()
    }

    /// Fresh signed read URL for the final object
    pub fn url(&self) -> &SignedUrl {
        &self.url
    }

    pub fn into_url(self) -> SignedUrl {
        self.url
    }

    /// Whether the object was replaced by transform output
    pub fn transformed(&self) -> bool {
        self.transformed
    }
}
