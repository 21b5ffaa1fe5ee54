//! Story store
//!
//! Ephemeral stories: reads filter to the 24 hour activity window,
//! expired records stay in storage. `mark_as_viewed` is the only write
//! to the viewed flag.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::data::blob::{BlobStore, load_collection, save_collection};
use crate::data::models::{NewStory, RecordId, Story, StoryKind, next_id};
use crate::data::{Latency, fixtures, observe_op};
use crate::error::AppError;

/// Author recorded on stories created without an explicit user
const DEFAULT_AUTHOR: &str = "1";

/// Story collection store
pub struct StoryStore {
    backend: Arc<dyn BlobStore>,
    key: String,
    latency: Latency,
}

impl StoryStore {
    /// Open the story store, seeding from bundled fixture data on first
    /// access. The check and the seed are one awaited step, so
    /// concurrent opens cannot observe a half-seeded key.
    pub async fn open(
        backend: Arc<dyn BlobStore>,
        namespace: &str,
        latency: Latency,
    ) -> Result<Self, AppError> {
        let store = Self {
            backend,
            key: format!("{namespace}_stories"),
            latency,
        };
        store.seed().await?;
        Ok(store)
    }

    async fn seed(&self) -> Result<(), AppError> {
        if self.backend.read(&self.key).await?.is_some() {
            return Ok(());
        }
        let records: Vec<Story> = fixtures::parse("stories", fixtures::STORIES);
        let source = if records.is_empty() { "empty" } else { "fixture" };
        self.persist(&records).await?;
        crate::metrics::STORE_SEEDS_TOTAL
            .with_label_values(&["stories", source])
            .inc();
        tracing::info!(records = records.len(), "Seeded stories collection");
        Ok(())
    }

    async fn records(&self) -> Result<Vec<Story>, AppError> {
        load_collection(self.backend.as_ref(), &self.key).await
    }

    async fn persist(&self, records: &[Story]) -> Result<(), AppError> {
        save_collection(self.backend.as_ref(), &self.key, records).await?;
        crate::metrics::RECORDS_TOTAL
            .with_label_values(&["stories"])
            .set(records.len() as i64);
        Ok(())
    }

    /// All active stories, in storage order.
    pub async fn get_all(&self) -> Result<Vec<Story>, AppError> {
        let started = Instant::now();
        self.latency.scan().await;
        let now = Utc::now();
        let active = self
            .records()
            .await?
            .into_iter()
            .filter(|s| s.is_active(now))
            .collect();
        observe_op("stories", "get_all", started);
        Ok(active)
    }

    /// Active stories grouped by their author's user id.
    pub async fn get_active_grouped(&self) -> Result<HashMap<String, Vec<Story>>, AppError> {
        let stories = self.get_all().await?;
        let mut grouped: HashMap<String, Vec<Story>> = HashMap::new();
        for story in stories {
            grouped.entry(story.user_id.clone()).or_default().push(story);
        }
        Ok(grouped)
    }

    /// Look up one story by id, without the activity filter.
    pub async fn get_by_id(&self, id: RecordId) -> Result<Option<Story>, AppError> {
        let started = Instant::now();
        self.latency.fetch().await;
        let story = self.records().await?.into_iter().find(|s| s.id == id);
        observe_op("stories", "get_by_id", started);
        Ok(story)
    }

    /// Create a story, assigning the next id.
    pub async fn create(&self, new_story: NewStory) -> Result<Story, AppError> {
        let started = Instant::now();
        self.latency.create().await;

        let content = new_story.content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::Validation(
                "story content is required".to_string(),
            ));
        }

        let mut stories = self.records().await?;
        let story = Story {
            id: next_id(&stories),
            user_id: new_story
                .user_id
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            content,
            kind: new_story.kind.unwrap_or(StoryKind::Image),
            timestamp: Utc::now(),
            viewed: false,
        };
        stories.push(story.clone());
        self.persist(&stories).await?;
        observe_op("stories", "create", started);
        Ok(story)
    }

    /// Set the viewed flag on a story.
    pub async fn mark_as_viewed(&self, id: RecordId) -> Result<Story, AppError> {
        let started = Instant::now();
        self.latency.fetch().await;

        let mut stories = self.records().await?;
        let story = stories
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(AppError::NotFound)?;
        story.viewed = true;
        let updated = story.clone();
        self.persist(&stories).await?;
        observe_op("stories", "mark_as_viewed", started);
        Ok(updated)
    }

    /// One user's active stories, in storage order.
    pub async fn get_user_stories(&self, user_id: &str) -> Result<Vec<Story>, AppError> {
        let started = Instant::now();
        self.latency.scan().await;
        let now = Utc::now();
        let stories = self
            .records()
            .await?
            .into_iter()
            .filter(|s| s.user_id == user_id && s.is_active(now))
            .collect();
        observe_op("stories", "get_user_stories", started);
        Ok(stories)
    }
}
