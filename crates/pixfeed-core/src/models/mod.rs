//! Domain models

pub mod feed;
pub mod object_key;
pub mod signed_url;
pub mod transform;

pub use feed::{
    CreateFeedPostRequest, FeedPost, FeedPostResponse, SignedUrlResponse, UpdateFeedPostRequest,
};
pub use object_key::ObjectKey;
pub use signed_url::{Direction, SignedUrl};
pub use transform::{FinalRef, TransformResult};
