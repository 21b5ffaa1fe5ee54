//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub latency: LatencyConfig,
    pub playback: PlaybackConfig,
    pub logging: LoggingConfig,
}

/// Storage configuration (key-value blob backend)
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON blob file per collection key
    pub data_dir: PathBuf,
    /// Prefix for collection keys (e.g. "snapgrid" -> "snapgrid_posts")
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    "snapgrid".to_string()
}

/// Simulated backend latency, per operation class
///
/// The delays emulate network I/O against the mock backend. They are
/// cosmetic and disabled wholesale in tests.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatencyConfig {
    /// Apply the delays at all
    pub enabled: bool,
    /// Single-record fetches and targeted field flips (ms)
    pub fetch_ms: u64,
    /// Full-collection reads, updates and deletes (ms)
    pub scan_ms: u64,
    /// Record creation (ms)
    pub create_ms: u64,
}

impl LatencyConfig {
    /// Latency profile with all delays disabled.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            fetch_ms: 0,
            scan_ms: 0,
            create_ms: 0,
        }
    }
}

/// Story playback timing
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PlaybackConfig {
    /// Progress tick cadence (ms)
    pub tick_ms: u64,
    /// Time one story is shown before auto-advancing (ms)
    pub story_duration_ms: u64,
}

impl PlaybackConfig {
    /// Progress added per tick, calibrated so a story completes
    /// in `story_duration_ms`.
    pub fn progress_per_tick(&self) -> f32 {
        100.0 * self.tick_ms as f32 / self.story_duration_ms as f32
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (SNAPGRID_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("storage.data_dir", "data")?
            .set_default("storage.namespace", "snapgrid")?
            .set_default("latency.enabled", true)?
            .set_default("latency.fetch_ms", 200)?
            .set_default("latency.scan_ms", 300)?
            .set_default("latency.create_ms", 400)?
            .set_default("playback.tick_ms", 100)?
            .set_default("playback.story_duration_ms", 5000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (SNAPGRID_*)
            .add_source(
                Environment::with_prefix("SNAPGRID")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.storage.namespace.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "storage.namespace must not be empty".to_string(),
            ));
        }

        if self.playback.tick_ms == 0 {
            return Err(crate::error::AppError::Config(
                "playback.tick_ms must be greater than 0".to_string(),
            ));
        }

        if self.playback.story_duration_ms < self.playback.tick_ms {
            return Err(crate::error::AppError::Config(
                "playback.story_duration_ms must be at least playback.tick_ms".to_string(),
            ));
        }

        if self.latency.enabled && self.latency.create_ms > 10_000 {
            tracing::warn!(
                create_ms = self.latency.create_ms,
                "latency.create_ms is unusually high; every create will block that long"
            );
        }

        Ok(())
    }
}
