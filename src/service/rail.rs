//! Story rail service
//!
//! Composes users with their active stories for the carousel strip and
//! opens playback sessions over a selection.

use std::sync::Arc;

use crate::config::PlaybackConfig;
use crate::data::{RecordId, StoryStore, User, UserStore};
use crate::error::AppError;
use crate::playback::StorySession;

/// One avatar slot in the rail.
#[derive(Debug, Clone)]
pub struct RailEntry {
    pub user: User,
    /// The user has at least one active story (the ring)
    pub has_story: bool,
    /// Every active story of this user is already viewed (dim ring)
    pub all_viewed: bool,
}

/// Outcome of tapping a rail avatar.
pub enum Selection {
    /// The signed-in user's own slot: story composer, no playback
    Compose,
    /// Viewer opened over the user's active stories
    View(StorySession),
    /// The user has no active stories
    NoStories,
}

impl std::fmt::Debug for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::Compose => f.write_str("Compose"),
            Selection::View(_) => f.write_str("View(..)"),
            Selection::NoStories => f.write_str("NoStories"),
        }
    }
}

/// Carousel composition over the user and story stores.
pub struct StoryRail {
    users: Arc<UserStore>,
    stories: Arc<StoryStore>,
    playback: PlaybackConfig,
}

impl StoryRail {
    pub fn new(
        users: Arc<UserStore>,
        stories: Arc<StoryStore>,
        playback: PlaybackConfig,
    ) -> Self {
        Self {
            users,
            stories,
            playback,
        }
    }

    /// Users and grouped active stories, fetched in parallel. Either
    /// fetch failing fails the whole load.
    pub async fn load(&self) -> Result<Vec<RailEntry>, AppError> {
        let (users, grouped) =
            tokio::try_join!(self.users.get_all(), self.stories.get_active_grouped())?;

        Ok(users
            .into_iter()
            .map(|user| {
                let stories = grouped.get(&user.id.to_string());
                let has_story = stories.is_some_and(|s| !s.is_empty());
                let all_viewed = stories
                    .is_some_and(|s| !s.is_empty() && s.iter().all(|story| story.viewed));
                RailEntry {
                    user,
                    has_story,
                    all_viewed,
                }
            })
            .collect())
    }

    /// Open the selected user's stories.
    ///
    /// The signed-in user's own slot composes instead of playing, and a
    /// user without active stories yields no viewer; both mirror the
    /// rail's tap behavior.
    pub async fn select(&self, user_id: RecordId) -> Result<Selection, AppError> {
        if user_id == self.users.current_user_id().await? {
            return Ok(Selection::Compose);
        }

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let stories = self
            .stories
            .get_user_stories(&user.id.to_string())
            .await?;
        if stories.is_empty() {
            return Ok(Selection::NoStories);
        }

        let session = StorySession::open(
            user,
            stories,
            Arc::clone(&self.stories),
            self.playback,
        )?;
        Ok(Selection::View(session))
    }
}
