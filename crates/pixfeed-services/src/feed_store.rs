use async_trait::async_trait;
use chrono::Utc;
use pixfeed_core::{AppError, FeedPost, ObjectKey};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Persistence for feed metadata rows
#[async_trait]
pub trait FeedItemStore: Send + Sync {
    async fn create(&self, post: FeedPost) -> Result<FeedPost, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<FeedPost>, AppError>;

    /// Apply the given fields; `None` when no post has this id
    async fn update(
        &self,
        id: Uuid,
        caption: Option<String>,
        object_key: Option<ObjectKey>,
    ) -> Result<Option<FeedPost>, AppError>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryFeedStore {
    posts: RwLock<HashMap<Uuid, FeedPost>>,
}

impl InMemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.posts.read().await.is_empty()
    }
}

#[async_trait]
impl FeedItemStore for InMemoryFeedStore {
    #[tracing::instrument(skip_all, fields(store.operation = "insert", store.record_id = %post.id))]
    async fn create(&self, post: FeedPost) -> Result<FeedPost, AppError> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(AppError::Internal(format!("Duplicate feed post id {}", post.id)));
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    #[tracing::instrument(skip(self), fields(store.operation = "select"))]
    async fn get(&self, id: Uuid) -> Result<Option<FeedPost>, AppError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    #[tracing::instrument(skip(self), fields(store.operation = "update"))]
    async fn update(
        &self,
        id: Uuid,
        caption: Option<String>,
        object_key: Option<ObjectKey>,
    ) -> Result<Option<FeedPost>, AppError> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(caption) = caption {
            post.caption = caption;
        }
        if let Some(object_key) = object_key {
            post.object_key = object_key;
        }
        post.updated_at = Utc::now();

        Ok(Some(post.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(caption: &str) -> FeedPost {
        FeedPost::new(caption.to_string(), ObjectKey::parse("raw/1.jpg").unwrap())
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = InMemoryFeedStore::new();
        let created = store.create(post("sunset")).await.unwrap();

        let fetched = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = InMemoryFeedStore::new();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_changes_only_given_fields() {
        let store = InMemoryFeedStore::new();
        let created = store.create(post("sunset")).await.unwrap();

        let updated = store
            .update(created.id, Some("sunrise".to_string()), None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.caption, "sunrise");
        assert_eq!(updated.object_key, created.object_key);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_is_none() {
        let store = InMemoryFeedStore::new();
        let result = store.update(Uuid::new_v4(), None, None).await.unwrap();
        assert!(result.is_none());
    }
}
