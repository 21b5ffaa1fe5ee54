//! Comment store
//!
//! Create, list and delete for the comments collection. Comments are
//! looked up by their post; the post's embedded id list is not kept in
//! sync by design.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::data::blob::{BlobStore, load_collection, save_collection};
use crate::data::models::{Comment, NewComment, RecordId, next_id};
use crate::data::{Latency, fixtures, observe_op};
use crate::error::AppError;

/// Author recorded on comments created without an explicit user
const DEFAULT_AUTHOR: &str = "1";

/// Comment collection store
pub struct CommentStore {
    backend: Arc<dyn BlobStore>,
    key: String,
    latency: Latency,
}

impl CommentStore {
    /// Open the comment store, seeding from bundled fixture data on
    /// first access.
    pub async fn open(
        backend: Arc<dyn BlobStore>,
        namespace: &str,
        latency: Latency,
    ) -> Result<Self, AppError> {
        let store = Self {
            backend,
            key: format!("{namespace}_comments"),
            latency,
        };
        store.seed().await?;
        Ok(store)
    }

    async fn seed(&self) -> Result<(), AppError> {
        if self.backend.read(&self.key).await?.is_some() {
            return Ok(());
        }
        let records: Vec<Comment> = fixtures::parse("comments", fixtures::COMMENTS);
        let source = if records.is_empty() { "empty" } else { "fixture" };
        self.persist(&records).await?;
        crate::metrics::STORE_SEEDS_TOTAL
            .with_label_values(&["comments", source])
            .inc();
        tracing::info!(records = records.len(), "Seeded comments collection");
        Ok(())
    }

    async fn records(&self) -> Result<Vec<Comment>, AppError> {
        load_collection(self.backend.as_ref(), &self.key).await
    }

    async fn persist(&self, records: &[Comment]) -> Result<(), AppError> {
        save_collection(self.backend.as_ref(), &self.key, records).await?;
        crate::metrics::RECORDS_TOTAL
            .with_label_values(&["comments"])
            .set(records.len() as i64);
        Ok(())
    }

    /// All comments, in storage order.
    pub async fn get_all(&self) -> Result<Vec<Comment>, AppError> {
        let started = Instant::now();
        self.latency.scan().await;
        let comments = self.records().await?;
        observe_op("comments", "get_all", started);
        Ok(comments)
    }

    /// The comment thread of one post, oldest first.
    pub async fn get_by_post(&self, post_id: RecordId) -> Result<Vec<Comment>, AppError> {
        let started = Instant::now();
        self.latency.scan().await;
        let thread = self
            .records()
            .await?
            .into_iter()
            .filter(|c| c.post_id == post_id)
            .collect();
        observe_op("comments", "get_by_post", started);
        Ok(thread)
    }

    /// Create a comment, assigning the next id.
    pub async fn create(&self, new_comment: NewComment) -> Result<Comment, AppError> {
        let started = Instant::now();
        self.latency.create().await;

        let text = new_comment.text.trim().to_string();
        if text.is_empty() {
            return Err(AppError::Validation(
                "comment text is required".to_string(),
            ));
        }

        let mut comments = self.records().await?;
        let comment = Comment {
            id: next_id(&comments),
            post_id: new_comment.post_id,
            user_id: new_comment
                .user_id
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            text,
            timestamp: Utc::now(),
        };
        comments.push(comment.clone());
        self.persist(&comments).await?;
        observe_op("comments", "create", started);
        Ok(comment)
    }

    /// Remove a comment. Removing an id that is already gone is a no-op.
    pub async fn delete(&self, id: RecordId) -> Result<(), AppError> {
        let started = Instant::now();
        self.latency.scan().await;

        let mut comments = self.records().await?;
        comments.retain(|c| c.id != id);
        self.persist(&comments).await?;
        observe_op("comments", "delete", started);
        Ok(())
    }
}
