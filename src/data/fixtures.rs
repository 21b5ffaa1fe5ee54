//! Bundled fixture data
//!
//! First-run seed content for each collection, compiled into the crate.
//! A fixture that fails to decode seeds an empty collection instead of
//! failing startup.

use serde::de::DeserializeOwned;

pub(crate) const POSTS: &str = include_str!("fixtures/posts.json");
pub(crate) const COMMENTS: &str = include_str!("fixtures/comments.json");
pub(crate) const STORIES: &str = include_str!("fixtures/stories.json");
pub(crate) const USERS: &str = include_str!("fixtures/users.json");

/// Decode a fixture payload, falling back to an empty collection.
pub(crate) fn parse<T: DeserializeOwned>(collection: &'static str, raw: &str) -> Vec<T> {
    match serde_json::from_str(raw) {
        Ok(records) => records,
        Err(error) => {
            tracing::error!(
                collection,
                %error,
                "failed to decode bundled fixture; seeding empty collection"
            );
            Vec::new()
        }
    }
}
