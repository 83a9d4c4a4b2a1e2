use super::ObjectKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Feed metadata row. The relay only ever reads `object_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPost {
    pub id: Uuid,
    pub caption: String,
    pub object_key: ObjectKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedPost {
    pub fn new(caption: String, object_key: ObjectKey) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            caption,
            object_key,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of `POST /feed`, sent after the client PUT the file to its signed URL.
///
/// `url` is the object key the file was uploaded under.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFeedPostRequest {
    #[validate(length(min = 1, message = "Caption is required or malformed"))]
    pub caption: String,
    #[validate(length(min = 1, message = "File url is required"))]
    pub url: String,
    #[validate(required(message = "Transform flag is missing"))]
    pub transform: Option<bool>,
}

/// Body of `PATCH /feed/{id}`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateFeedPostRequest {
    #[validate(length(min = 1, message = "Caption must not be empty"))]
    pub caption: Option<String>,
    #[validate(length(min = 1, message = "File url must not be empty"))]
    pub url: Option<String>,
}

impl UpdateFeedPostRequest {
    pub fn is_empty(&self) -> bool {
        self.caption.is_none() && self.url.is_none()
    }
}

/// Feed post as returned to clients: `url` is a signed read URL, not the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPostResponse {
    pub id: Uuid,
    pub caption: String,
    pub url: String,
    /// Set only on the response to the request that ran the relay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformed: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedPostResponse {
    pub fn from_post(post: FeedPost, url: String, transformed: Option<bool>) -> Self {
        Self {
            id: post.id,
            caption: post.caption,
            url,
            transformed,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Response of `GET /feed/signed-url/{file_name}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedUrlResponse {
    pub url: String,
    pub key: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_requires_transform_flag() {
        let req: CreateFeedPostRequest =
            serde_json::from_str(r#"{"caption":"hello","url":"raw/1.jpg"}"#).unwrap();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("Transform flag is missing"));
    }

    #[test]
    fn test_create_request_rejects_empty_caption() {
        let req: CreateFeedPostRequest =
            serde_json::from_str(r#"{"caption":"","url":"raw/1.jpg","transform":false}"#)
                .unwrap();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("Caption is required"));
    }

    #[test]
    fn test_create_request_valid() {
        let req: CreateFeedPostRequest =
            serde_json::from_str(r#"{"caption":"hi","url":"raw/1.jpg","transform":true}"#)
                .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.transform, Some(true));
    }

    #[test]
    fn test_update_request_empty() {
        let req: UpdateFeedPostRequest = serde_json::from_str("{}").unwrap();
        assert!(req.is_empty());
        assert!(req.validate().is_ok());
    }
}
