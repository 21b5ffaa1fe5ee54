//! SnapGrid binary entry point
//!
//! Headless smoke run over the mock backend: seeds the stores on first
//! launch, then loads the feed and the story rail the way the app's
//! home screen would.

use snapgrid::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Initialize tracing/logging
/// 2. Initialize metrics
/// 3. Load configuration from file and environment
/// 4. Initialize AppState (opens + seeds the stores)
/// 5. Load feed and story rail in parallel and report
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize tracing/logging
    let log_format =
        std::env::var("SNAPGRID__LOGGING__FORMAT").unwrap_or_else(|_| "pretty".to_string());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "snapgrid=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "snapgrid=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!("Starting SnapGrid...");

    // 2. Initialize metrics
    snapgrid::metrics::init_metrics();

    // 3. Load configuration
    let config = config::AppConfig::load()?;
    tracing::info!(
        data_dir = %config.storage.data_dir.display(),
        namespace = %config.storage.namespace,
        "Configuration loaded"
    );

    // 4. Initialize application state
    let state = AppState::new(config).await?;

    // 5. Load the home screen: feed and story rail in parallel
    let rail = state.story_rail();
    let (feed, rail_entries) = tokio::try_join!(state.feed(), rail.load())?;

    let current_user = state.users.get_current_user().await?;
    let with_stories = rail_entries.iter().filter(|e| e.has_story).count();

    tracing::info!(
        posts = feed.items().len(),
        rail_users = rail_entries.len(),
        rail_with_stories = with_stories,
        current_user = current_user.as_ref().map(|u| u.username.as_str()),
        "Home screen loaded"
    );

    Ok(())
}
