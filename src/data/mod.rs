//! Data layer module
//!
//! Entity collections over the key-value blob backend:
//! - `blob`: raw storage backends + collection helpers
//! - `models`: record types and typed draft/patch records
//! - one store per collection, each owning its storage key
//! - `fixtures`: bundled first-run seed data

mod blob;
mod comments;
mod fixtures;
mod models;
mod posts;
mod stories;
mod users;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore, load_collection, save_collection};
pub use comments::CommentStore;
pub use models::*;
pub use posts::PostStore;
pub use stories::StoryStore;
pub use users::{DEFAULT_CURRENT_USER_ID, UserStore};

use std::time::{Duration, Instant};

use crate::config::LatencyConfig;

/// Simulated backend latency applied by store operations.
///
/// Emulates network I/O against the mock backend; purely cosmetic and
/// disabled wholesale in tests.
#[derive(Debug, Clone, Copy)]
pub struct Latency {
    config: LatencyConfig,
}

impl Latency {
    pub fn new(config: LatencyConfig) -> Self {
        Self { config }
    }

    /// Profile with all delays off.
    pub fn disabled() -> Self {
        Self {
            config: LatencyConfig::disabled(),
        }
    }

    /// Delay for single-record fetches and targeted field flips.
    pub(crate) async fn fetch(&self) {
        self.sleep(self.config.fetch_ms).await;
    }

    /// Delay for full-collection reads, updates and deletes.
    pub(crate) async fn scan(&self) {
        self.sleep(self.config.scan_ms).await;
    }

    /// Delay for record creation.
    pub(crate) async fn create(&self) {
        self.sleep(self.config.create_ms).await;
    }

    async fn sleep(&self, ms: u64) {
        if self.config.enabled && ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

/// Record one finished store operation in the metrics.
pub(crate) fn observe_op(collection: &'static str, operation: &'static str, started: Instant) {
    crate::metrics::STORE_OPS_TOTAL
        .with_label_values(&[operation, collection])
        .inc();
    crate::metrics::STORE_OP_DURATION_SECONDS
        .with_label_values(&[operation, collection])
        .observe(started.elapsed().as_secs_f64());
}
