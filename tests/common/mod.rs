//! Common test utilities for E2E tests

use snapgrid::data::{BlobStore, FileBlobStore};
use snapgrid::{AppState, config};
use tempfile::TempDir;

/// Namespace used by every test app
pub const NAMESPACE: &str = "snapgrid";

/// Test application over an isolated data directory
pub struct TestApp {
    pub state: AppState,
    pub config: config::AppConfig,
    pub _temp_dir: TempDir,
}

impl TestApp {
    /// App seeded from the bundled fixtures, latency off, fast playback.
    pub async fn new() -> Self {
        Self::build(false).await
    }

    /// App whose posts, comments and stories collections start empty
    /// (users keep their fixture seed so a current user exists).
    pub async fn empty() -> Self {
        Self::build(true).await
    }

    async fn build(empty_collections: bool) -> Self {
        let temp_dir = TempDir::new().unwrap();

        let config = config::AppConfig {
            storage: config::StorageConfig {
                data_dir: temp_dir.path().join("data"),
                namespace: NAMESPACE.to_string(),
            },
            latency: config::LatencyConfig::disabled(),
            playback: config::PlaybackConfig {
                tick_ms: 10,
                story_duration_ms: 60,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        if empty_collections {
            let backend = FileBlobStore::open(config.storage.data_dir.clone())
                .await
                .unwrap();
            for collection in ["posts", "comments", "stories"] {
                backend
                    .write(&collection_key(collection), "[]")
                    .await
                    .unwrap();
            }
        }

        let state = AppState::new(config.clone()).await.unwrap();

        Self {
            state,
            config,
            _temp_dir: temp_dir,
        }
    }

    /// Open a second state over the same data directory, as a fresh
    /// process launch would.
    pub async fn reopen(&self) -> AppState {
        AppState::new(self.config.clone()).await.unwrap()
    }

    /// Direct handle on the app's blob backend, bypassing the stores.
    pub async fn raw_backend(&self) -> FileBlobStore {
        FileBlobStore::open(self.config.storage.data_dir.clone())
            .await
            .unwrap()
    }
}

/// Storage key of a collection under the test namespace.
pub fn collection_key(collection: &str) -> String {
    format!("{NAMESPACE}_{collection}")
}

/// Poll until `check` passes or the deadline runs out.
///
/// The closure must return an owned future (clone the store handles it
/// needs into an `async move` block).
pub async fn eventually<Fut>(mut check: impl FnMut() -> Fut)
where
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("condition did not become true in time");
}
