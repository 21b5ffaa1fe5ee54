//! Post store
//!
//! CRUD, interaction toggles and search reads for the posts collection.
//! Every operation reloads the full collection, mutates it in memory and
//! writes it back whole; acceptable only because the working set is a
//! small fixture-sized dataset.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::data::blob::{BlobStore, load_collection, save_collection};
use crate::data::models::{NewPost, Post, PostPatch, RecordId, next_id};
use crate::data::{Latency, fixtures, observe_op};
use crate::error::AppError;

/// Author recorded on posts created without an explicit user
const DEFAULT_AUTHOR: &str = "user1";

/// Post collection store
pub struct PostStore {
    backend: Arc<dyn BlobStore>,
    key: String,
    latency: Latency,
}

impl PostStore {
    /// Open the post store, seeding the collection from bundled fixture
    /// data on first access. Seeding is a single awaited step; a second
    /// open over the same key observes the finished seed.
    pub async fn open(
        backend: Arc<dyn BlobStore>,
        namespace: &str,
        latency: Latency,
    ) -> Result<Self, AppError> {
        let store = Self {
            backend,
            key: format!("{namespace}_posts"),
            latency,
        };
        store.seed().await?;
        Ok(store)
    }

    async fn seed(&self) -> Result<(), AppError> {
        if self.backend.read(&self.key).await?.is_some() {
            return Ok(());
        }
        let records: Vec<Post> = fixtures::parse("posts", fixtures::POSTS);
        let source = if records.is_empty() { "empty" } else { "fixture" };
        self.persist(&records).await?;
        crate::metrics::STORE_SEEDS_TOTAL
            .with_label_values(&["posts", source])
            .inc();
        tracing::info!(records = records.len(), "Seeded posts collection");
        Ok(())
    }

    async fn records(&self) -> Result<Vec<Post>, AppError> {
        load_collection(self.backend.as_ref(), &self.key).await
    }

    async fn persist(&self, records: &[Post]) -> Result<(), AppError> {
        save_collection(self.backend.as_ref(), &self.key, records).await?;
        crate::metrics::RECORDS_TOTAL
            .with_label_values(&["posts"])
            .set(records.len() as i64);
        Ok(())
    }

    /// All posts, newest first.
    pub async fn get_all(&self) -> Result<Vec<Post>, AppError> {
        let started = Instant::now();
        self.latency.scan().await;
        let mut posts = self.records().await?;
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        observe_op("posts", "get_all", started);
        Ok(posts)
    }

    /// Look up one post by id.
    pub async fn get_by_id(&self, id: RecordId) -> Result<Option<Post>, AppError> {
        let started = Instant::now();
        self.latency.fetch().await;
        let post = self.records().await?.into_iter().find(|p| p.id == id);
        observe_op("posts", "get_by_id", started);
        Ok(post)
    }

    /// Create a post, assigning the next id and filling collection
    /// defaults for everything the caller left out.
    pub async fn create(&self, new_post: NewPost) -> Result<Post, AppError> {
        let started = Instant::now();
        self.latency.create().await;

        let image_url = new_post.image_url.trim().to_string();
        if image_url.is_empty() {
            return Err(AppError::Validation(
                "post image url is required".to_string(),
            ));
        }

        let mut posts = self.records().await?;
        let post = Post {
            id: next_id(&posts),
            user_id: new_post
                .user_id
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            image_url,
            caption: new_post.caption.unwrap_or_default(),
            hashtags: new_post.hashtags.unwrap_or_default(),
            likes: 0,
            comments: Vec::new(),
            timestamp: Utc::now(),
            saved: false,
        };
        posts.push(post.clone());
        self.persist(&posts).await?;
        observe_op("posts", "create", started);
        Ok(post)
    }

    /// Merge a patch over an existing post. The id is immutable.
    pub async fn update(&self, id: RecordId, patch: PostPatch) -> Result<Post, AppError> {
        let started = Instant::now();
        self.latency.scan().await;

        let mut posts = self.records().await?;
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(AppError::NotFound)?;
        post.apply(patch);
        let updated = post.clone();
        self.persist(&posts).await?;
        observe_op("posts", "update", started);
        Ok(updated)
    }

    /// Remove a post. Removing an id that is already gone is a no-op.
    pub async fn delete(&self, id: RecordId) -> Result<(), AppError> {
        let started = Instant::now();
        self.latency.scan().await;

        let mut posts = self.records().await?;
        posts.retain(|p| p.id != id);
        self.persist(&posts).await?;
        observe_op("posts", "delete", started);
        Ok(())
    }

    /// Flip the like counter: one like taken back if any, one added
    /// otherwise. Two calls always return the counter to its start.
    pub async fn toggle_like(&self, id: RecordId) -> Result<Post, AppError> {
        let started = Instant::now();
        self.latency.fetch().await;

        let mut posts = self.records().await?;
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(AppError::NotFound)?;
        post.likes = if post.likes > 0 {
            post.likes - 1
        } else {
            post.likes + 1
        };
        let updated = post.clone();
        self.persist(&posts).await?;
        observe_op("posts", "toggle_like", started);
        Ok(updated)
    }

    /// Flip the bookmark flag.
    pub async fn toggle_save(&self, id: RecordId) -> Result<Post, AppError> {
        let started = Instant::now();
        self.latency.fetch().await;

        let mut posts = self.records().await?;
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(AppError::NotFound)?;
        post.saved = !post.saved;
        let updated = post.clone();
        self.persist(&posts).await?;
        observe_op("posts", "toggle_save", started);
        Ok(updated)
    }

    /// Posts the user bookmarked, in storage order.
    pub async fn get_saved(&self) -> Result<Vec<Post>, AppError> {
        let started = Instant::now();
        self.latency.scan().await;
        let saved = self
            .records()
            .await?
            .into_iter()
            .filter(|p| p.saved)
            .collect();
        observe_op("posts", "get_saved", started);
        Ok(saved)
    }

    /// Posts with a hashtag containing the query, case-insensitive.
    pub async fn search_by_hashtag(&self, hashtag: &str) -> Result<Vec<Post>, AppError> {
        let started = Instant::now();
        self.latency.scan().await;
        let needle = hashtag.to_lowercase();
        let matches = self
            .records()
            .await?
            .into_iter()
            .filter(|p| p.hashtags.iter().any(|tag| tag.to_lowercase().contains(&needle)))
            .collect();
        observe_op("posts", "search_by_hashtag", started);
        Ok(matches)
    }

    /// Posts whose caption contains the query, case-insensitive.
    pub async fn search_by_caption(&self, query: &str) -> Result<Vec<Post>, AppError> {
        let started = Instant::now();
        self.latency.scan().await;
        let needle = query.to_lowercase();
        let matches = self
            .records()
            .await?
            .into_iter()
            .filter(|p| p.caption.to_lowercase().contains(&needle))
            .collect();
        observe_op("posts", "search_by_caption", started);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryBlobStore;

    /// Store over an already-empty collection, bypassing the fixture seed.
    async fn empty_store() -> PostStore {
        let backend = Arc::new(MemoryBlobStore::new());
        backend.write("test_posts", "[]").await.unwrap();
        PostStore::open(backend, "test", Latency::disabled())
            .await
            .unwrap()
    }

    fn draft(image_url: &str) -> NewPost {
        NewPost {
            image_url: image_url.to_string(),
            ..NewPost::default()
        }
    }

    #[tokio::test]
    async fn create_on_empty_collection_starts_at_one() {
        let store = empty_store().await;

        let post = store
            .create(NewPost {
                image_url: "x".to_string(),
                caption: Some("hi".to_string()),
                hashtags: Some(vec!["a".to_string(), "b".to_string()]),
                user_id: None,
            })
            .await
            .unwrap();

        assert_eq!(post.id, 1);
        assert_eq!(post.likes, 0);
        assert!(!post.saved);
        assert!(post.comments.is_empty());
        assert_eq!(post.hashtags, vec!["a", "b"]);
        assert_eq!(post.caption, "hi");
        assert_eq!(post.user_id, "user1");
    }

    #[tokio::test]
    async fn ids_stay_monotonic_after_delete() {
        let store = empty_store().await;
        let first = store.create(draft("a")).await.unwrap();
        let second = store.create(draft("b")).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        store.delete(2).await.unwrap();
        let third = store.create(draft("c")).await.unwrap();
        // max(existing) + 1, so a freed id is reused after the tail is deleted
        assert_eq!(third.id, 2);

        store.delete(1).await.unwrap();
        let fourth = store.create(draft("d")).await.unwrap();
        assert_eq!(fourth.id, 3);
    }

    #[tokio::test]
    async fn create_rejects_blank_image_url() {
        let store = empty_store().await;
        let error = store.create(draft("   ")).await.unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn update_merges_and_keeps_id() {
        let store = empty_store().await;
        let created = store
            .create(NewPost {
                image_url: "x".to_string(),
                caption: Some("before".to_string()),
                hashtags: Some(vec!["old".to_string()]),
                user_id: None,
            })
            .await
            .unwrap();

        let updated = store
            .update(
                created.id,
                PostPatch {
                    caption: Some("after".to_string()),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.caption, "after");
        // untouched fields survive the merge
        assert_eq!(updated.image_url, "x");
        assert_eq!(updated.hashtags, vec!["old"]);
    }

    #[tokio::test]
    async fn update_missing_id_is_not_found() {
        let store = empty_store().await;
        let error = store.update(99, PostPatch::default()).await.unwrap_err();
        assert!(matches!(error, AppError::NotFound));
    }

    #[tokio::test]
    async fn toggle_like_pair_restores_count() {
        let store = empty_store().await;
        let post = store.create(draft("x")).await.unwrap();

        let liked = store.toggle_like(post.id).await.unwrap();
        assert_eq!(liked.likes, 1);
        let unliked = store.toggle_like(post.id).await.unwrap();
        assert_eq!(unliked.likes, 0);
    }

    #[tokio::test]
    async fn toggle_save_pair_restores_flag() {
        let store = empty_store().await;
        let post = store.create(draft("x")).await.unwrap();
        assert!(!post.saved);

        assert!(store.toggle_save(post.id).await.unwrap().saved);
        assert!(!store.toggle_save(post.id).await.unwrap().saved);
    }

    #[tokio::test]
    async fn toggle_on_missing_id_is_not_found() {
        let store = empty_store().await;
        assert!(matches!(
            store.toggle_like(7).await.unwrap_err(),
            AppError::NotFound
        ));
        assert!(matches!(
            store.toggle_save(7).await.unwrap_err(),
            AppError::NotFound
        ));
    }

    #[tokio::test]
    async fn delete_missing_id_is_silent() {
        let store = empty_store().await;
        store.delete(42).await.unwrap();
    }

    #[tokio::test]
    async fn get_all_sorts_newest_first() {
        let store = empty_store().await;
        // created in sequence, so later posts have later timestamps
        let a = store.create(draft("a")).await.unwrap();
        let b = store.create(draft("b")).await.unwrap();
        let c = store.create(draft("c")).await.unwrap();

        let all = store.get_all().await.unwrap();
        let ids: Vec<_> = all.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_substring() {
        let store = empty_store().await;
        store
            .create(NewPost {
                image_url: "x".to_string(),
                caption: Some("Morning Coffee ritual".to_string()),
                hashtags: Some(vec!["SlowMorning".to_string()]),
                user_id: None,
            })
            .await
            .unwrap();

        assert_eq!(store.search_by_caption("coffee").await.unwrap().len(), 1);
        assert_eq!(store.search_by_caption("tea").await.unwrap().len(), 0);
        assert_eq!(store.search_by_hashtag("morning").await.unwrap().len(), 1);
        assert_eq!(store.search_by_hashtag("night").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn open_seeds_fixture_once() {
        let backend = Arc::new(MemoryBlobStore::new());
        let store = PostStore::open(Arc::clone(&backend) as Arc<dyn BlobStore>, "seeded", Latency::disabled())
            .await
            .unwrap();
        let seeded = store.get_all().await.unwrap();
        assert!(!seeded.is_empty());

        // second open over the same key must not reset the collection
        let created = store.create(draft("new")).await.unwrap();
        let reopened = PostStore::open(backend, "seeded", Latency::disabled())
            .await
            .unwrap();
        assert!(
            reopened
                .get_by_id(created.id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn malformed_blob_reads_as_empty() {
        let backend = Arc::new(MemoryBlobStore::new());
        backend.write("test_posts", "{broken").await.unwrap();
        let store = PostStore::open(backend, "test", Latency::disabled())
            .await
            .unwrap();

        assert!(store.get_all().await.unwrap().is_empty());
    }
}
