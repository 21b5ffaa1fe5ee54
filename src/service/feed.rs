//! Feed service
//!
//! A loaded feed snapshot with optimistic like/save toggles and the
//! per-post comment thread. Optimistic means the local snapshot flips
//! before the store write; a failed write rolls the snapshot back and
//! the error propagates once, with no retry.

use std::sync::Arc;

use crate::data::{Comment, CommentStore, NewComment, Post, PostStore, RecordId};
use crate::error::AppError;

/// One user-visible feed, loaded newest post first.
pub struct FeedSession {
    posts: Arc<PostStore>,
    comments: Arc<CommentStore>,
    items: Vec<Post>,
}

impl FeedSession {
    /// Load the feed.
    pub async fn load(
        posts: Arc<PostStore>,
        comments: Arc<CommentStore>,
    ) -> Result<Self, AppError> {
        let items = posts.get_all().await?;
        Ok(Self {
            posts,
            comments,
            items,
        })
    }

    /// The current snapshot, newest post first.
    pub fn items(&self) -> &[Post] {
        &self.items
    }

    /// Re-fetch the snapshot from the store (manual retry affordance).
    pub async fn reload(&mut self) -> Result<(), AppError> {
        self.items = self.posts.get_all().await?;
        Ok(())
    }

    /// Toggle the like counter on a post, optimistically.
    pub async fn toggle_like(&mut self, post_id: RecordId) -> Result<&Post, AppError> {
        let index = self
            .items
            .iter()
            .position(|p| p.id == post_id)
            .ok_or(AppError::NotFound)?;
        let previous = self.items[index].clone();
        self.items[index].likes = if previous.likes > 0 {
            previous.likes - 1
        } else {
            previous.likes + 1
        };

        let result = self.posts.toggle_like(post_id).await;
        match result {
            Ok(updated) => {
                self.items[index] = updated;
                Ok(&self.items[index])
            }
            Err(error) => {
                // revert the optimistic flip before surfacing the failure
                self.items[index] = previous;
                crate::metrics::ERRORS_TOTAL
                    .with_label_values(&[error.metric_label(), "toggle_like"])
                    .inc();
                Err(error)
            }
        }
    }

    /// Toggle the bookmark flag on a post, optimistically.
    pub async fn toggle_save(&mut self, post_id: RecordId) -> Result<&Post, AppError> {
        let index = self
            .items
            .iter()
            .position(|p| p.id == post_id)
            .ok_or(AppError::NotFound)?;
        let previous = self.items[index].clone();
        self.items[index].saved = !previous.saved;

        let result = self.posts.toggle_save(post_id).await;
        match result {
            Ok(updated) => {
                self.items[index] = updated;
                Ok(&self.items[index])
            }
            Err(error) => {
                self.items[index] = previous;
                crate::metrics::ERRORS_TOTAL
                    .with_label_values(&[error.metric_label(), "toggle_save"])
                    .inc();
                Err(error)
            }
        }
    }

    /// The comment thread of one post, oldest first.
    pub async fn comments_for(&self, post_id: RecordId) -> Result<Vec<Comment>, AppError> {
        self.comments.get_by_post(post_id).await
    }

    /// Add a comment to a post as the signed-in user.
    pub async fn add_comment(
        &self,
        post_id: RecordId,
        text: &str,
    ) -> Result<Comment, AppError> {
        self.comments
            .create(NewComment {
                post_id,
                text: text.to_string(),
                user_id: None,
            })
            .await
    }

    /// Remove a comment.
    pub async fn remove_comment(&self, comment_id: RecordId) -> Result<(), AppError> {
        self.comments.delete(comment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BlobStore, Latency, MemoryBlobStore, NewPost};
    use async_trait::async_trait;

    mockall::mock! {
        pub Blob {}

        #[async_trait]
        impl BlobStore for Blob {
            async fn read(&self, key: &str) -> Result<Option<String>, AppError>;
            async fn write(&self, key: &str, value: &str) -> Result<(), AppError>;
        }
    }

    async fn session_with_posts(n: usize) -> FeedSession {
        let backend = Arc::new(MemoryBlobStore::new());
        backend.write("test_posts", "[]").await.unwrap();
        backend.write("test_comments", "[]").await.unwrap();
        let posts = Arc::new(
            PostStore::open(
                Arc::clone(&backend) as Arc<dyn BlobStore>,
                "test",
                Latency::disabled(),
            )
            .await
            .unwrap(),
        );
        let comments = Arc::new(
            CommentStore::open(backend, "test", Latency::disabled())
                .await
                .unwrap(),
        );
        for i in 0..n {
            posts
                .create(NewPost {
                    image_url: format!("img-{i}"),
                    ..NewPost::default()
                })
                .await
                .unwrap();
        }
        FeedSession::load(posts, comments).await.unwrap()
    }

    #[tokio::test]
    async fn toggle_like_updates_snapshot_from_store() {
        let mut session = session_with_posts(2).await;
        let post_id = session.items()[0].id;

        let updated = session.toggle_like(post_id).await.unwrap();
        assert_eq!(updated.likes, 1);
        assert_eq!(
            session
                .items()
                .iter()
                .find(|p| p.id == post_id)
                .unwrap()
                .likes,
            1
        );
    }

    #[tokio::test]
    async fn toggle_on_unknown_post_is_not_found() {
        let mut session = session_with_posts(1).await;
        assert!(matches!(
            session.toggle_like(99).await.unwrap_err(),
            AppError::NotFound
        ));
        assert!(matches!(
            session.toggle_save(99).await.unwrap_err(),
            AppError::NotFound
        ));
    }

    #[tokio::test]
    async fn failed_toggle_reverts_optimistic_flip() {
        // backend that serves one post but refuses every write
        let post = crate::data::Post {
            id: 1,
            user_id: "1".to_string(),
            image_url: "img".to_string(),
            caption: String::new(),
            hashtags: Vec::new(),
            likes: 5,
            comments: Vec::new(),
            timestamp: chrono::Utc::now(),
            saved: false,
        };
        let blob = serde_json::to_string(&[post]).unwrap();

        let mut mock = MockBlob::new();
        let served = blob.clone();
        mock.expect_read()
            .returning(move |_| Ok(Some(served.clone())));
        mock.expect_write()
            .returning(|_, _| Err(AppError::Storage("backend offline".to_string())));

        let backend: Arc<dyn BlobStore> = Arc::new(mock);
        let posts = Arc::new(
            PostStore::open(Arc::clone(&backend), "test", Latency::disabled())
                .await
                .unwrap(),
        );
        let comments = Arc::new(
            CommentStore::open(backend, "test", Latency::disabled())
                .await
                .unwrap(),
        );
        let mut session = FeedSession::load(posts, comments).await.unwrap();
        assert_eq!(session.items()[0].likes, 5);

        let error = session.toggle_like(1).await.unwrap_err();
        assert!(matches!(error, AppError::Storage(_)));
        // the optimistic decrement was rolled back
        assert_eq!(session.items()[0].likes, 5);

        let error = session.toggle_save(1).await.unwrap_err();
        assert!(matches!(error, AppError::Storage(_)));
        assert!(!session.items()[0].saved);
    }

    #[tokio::test]
    async fn comment_flow_roundtrip() {
        let session = session_with_posts(1).await;
        let post_id = session.items()[0].id;

        assert!(session.comments_for(post_id).await.unwrap().is_empty());

        let comment = session.add_comment(post_id, "first!").await.unwrap();
        assert_eq!(comment.post_id, post_id);

        let thread = session.comments_for(post_id).await.unwrap();
        assert_eq!(thread.len(), 1);

        session.remove_comment(comment.id).await.unwrap();
        assert!(session.comments_for(post_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_comment_rejects_blank_text() {
        let session = session_with_posts(1).await;
        let post_id = session.items()[0].id;
        let error = session.add_comment(post_id, "  ").await.unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));
    }
}
