//! SnapGrid - a local-first social feed engine
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Feed snapshot with optimistic toggles                    │
//! │  - Story rail composition + playback sessions               │
//! │  - Search and profile flows                                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - Four entity stores (posts, comments, stories, users)     │
//! │  - JSON blob backend (file-backed or in-memory)             │
//! │  - Bundled fixture seeding, simulated latency               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The backend is a mock: every operation reloads its whole collection,
//! mutates it in memory and writes it back. There are no transactions
//! and no cross-collection consistency; consumers treat foreign keys
//! defensively.
//!
//! # Modules
//!
//! - `data`: entity stores and the blob backend
//! - `playback`: story viewer state machine and ticker session
//! - `service`: feed, rail, search and profile flows
//! - `config`: configuration management
//! - `error`: error types
//! - `metrics`: Prometheus instruments

pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod playback;
pub mod service;

use std::sync::Arc;

use crate::data::{CommentStore, FileBlobStore, Latency, PostStore, StoryStore, UserStore};

/// Application state shared across all consumers
///
/// Holds the configuration and one handle per entity store. All stores
/// share a single blob backend and are seeded before the state is
/// handed out.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Post collection store
    pub posts: Arc<PostStore>,

    /// Comment collection store
    pub comments: Arc<CommentStore>,

    /// Story collection store
    pub stories: Arc<StoryStore>,

    /// User collection store + current-user key
    pub users: Arc<UserStore>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Open the file-backed blob store
    /// 2. Open the four entity stores, seeding each on first run
    ///
    /// # Errors
    /// Returns error if the data directory or a seed write fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Open the blob backend
        let backend: Arc<dyn data::BlobStore> =
            Arc::new(FileBlobStore::open(config.storage.data_dir.clone()).await?);
        tracing::info!(data_dir = %config.storage.data_dir.display(), "Blob store opened");

        // 2. Open the entity stores; seeding runs inside each open
        let latency = Latency::new(config.latency);
        let namespace = config.storage.namespace.clone();
        let (posts, comments, stories, users) = tokio::try_join!(
            PostStore::open(Arc::clone(&backend), &namespace, latency),
            CommentStore::open(Arc::clone(&backend), &namespace, latency),
            StoryStore::open(Arc::clone(&backend), &namespace, latency),
            UserStore::open(Arc::clone(&backend), &namespace, latency),
        )?;
        tracing::info!("Entity stores ready");

        Ok(Self {
            config: Arc::new(config),
            posts: Arc::new(posts),
            comments: Arc::new(comments),
            stories: Arc::new(stories),
            users: Arc::new(users),
        })
    }

    /// Story rail service over this state's stores.
    pub fn story_rail(&self) -> service::StoryRail {
        service::StoryRail::new(
            Arc::clone(&self.users),
            Arc::clone(&self.stories),
            self.config.playback,
        )
    }

    /// Search service over this state's stores.
    pub fn search(&self) -> service::SearchService {
        service::SearchService::new(Arc::clone(&self.users), Arc::clone(&self.posts))
    }

    /// Profile service over this state's stores.
    pub fn profile(&self) -> service::ProfileService {
        service::ProfileService::new(Arc::clone(&self.users), Arc::clone(&self.posts))
    }

    /// Load a feed session over this state's stores.
    pub async fn feed(&self) -> Result<service::FeedSession, error::AppError> {
        service::FeedSession::load(Arc::clone(&self.posts), Arc::clone(&self.comments)).await
    }
}
