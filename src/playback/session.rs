//! Story playback session
//!
//! Wraps the pure machine with its runtime: a recurring progress ticker
//! and fire-and-forget view marks. The ticker is torn down and
//! re-created whenever the governing state changes, so at most one
//! timer exists per viewer, and none survives the session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::PlaybackConfig;
use crate::data::{RecordId, Story, StoryStore, User};
use crate::error::AppError;
use crate::playback::machine::{Playback, PlaybackState, Transition};

/// A running story viewer for one user's story list.
pub struct StorySession {
    user: User,
    playback: Arc<Mutex<Playback>>,
    stories_store: Arc<StoryStore>,
    settings: PlaybackConfig,
    ticker: Option<JoinHandle<()>>,
}

impl StorySession {
    /// Open the viewer and start the ticker on the first story.
    pub fn open(
        user: User,
        stories: Vec<Story>,
        stories_store: Arc<StoryStore>,
        settings: PlaybackConfig,
    ) -> Result<Self, AppError> {
        let (playback, transition) = Playback::open(stories)?;
        let state = playback.state();
        let mut session = Self {
            user,
            playback: Arc::new(Mutex::new(playback)),
            stories_store,
            settings,
            ticker: None,
        };
        record_transition("open");
        session.apply(transition, state);
        Ok(session)
    }

    /// The user whose stories are on screen.
    pub fn user(&self) -> &User {
        &self.user
    }

    pub async fn state(&self) -> PlaybackState {
        self.playback.lock().await.state()
    }

    /// The story on screen, if the viewer is open.
    pub async fn current_story(&self) -> Option<Story> {
        self.playback.lock().await.current_story().cloned()
    }

    /// Manual advance (right zone / arrow-right).
    pub async fn next(&mut self) -> PlaybackState {
        let (transition, state) = {
            let mut playback = self.playback.lock().await;
            let transition = playback.next();
            (transition, playback.state())
        };
        record_transition("next");
        self.apply(transition, state);
        state
    }

    /// Manual step back (left zone / arrow-left).
    pub async fn previous(&mut self) -> PlaybackState {
        let (transition, state) = {
            let mut playback = self.playback.lock().await;
            let transition = playback.previous();
            (transition, playback.state())
        };
        record_transition("previous");
        self.apply(transition, state);
        state
    }

    /// Pointer entered the viewer surface.
    pub async fn pause(&mut self) -> PlaybackState {
        let (transition, state) = {
            let mut playback = self.playback.lock().await;
            let transition = playback.pause();
            (transition, playback.state())
        };
        record_transition("pause");
        self.apply(transition, state);
        state
    }

    /// Pointer left the viewer surface.
    pub async fn resume(&mut self) -> PlaybackState {
        let (transition, state) = {
            let mut playback = self.playback.lock().await;
            let transition = playback.resume();
            (transition, playback.state())
        };
        record_transition("resume");
        self.apply(transition, state);
        state
    }

    /// Dismiss the viewer (escape / close control / backdrop).
    pub async fn close(&mut self) -> PlaybackState {
        let (transition, state) = {
            let mut playback = self.playback.lock().await;
            let transition = playback.close();
            (transition, playback.state())
        };
        record_transition("close");
        self.apply(transition, state);
        state
    }

    fn apply(&mut self, transition: Transition, state: PlaybackState) {
        if let Some(story_id) = transition.mark_viewed {
            spawn_view_mark(Arc::clone(&self.stories_store), story_id);
        }
        if transition.restart_ticker {
            self.stop_ticker();
            if state.is_playing() {
                self.start_ticker();
            }
        }
    }

    fn start_ticker(&mut self) {
        let playback = Arc::clone(&self.playback);
        let store = Arc::clone(&self.stories_store);
        let tick = Duration::from_millis(self.settings.tick_ms);
        let increment = self.settings.progress_per_tick();

        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // the first tick of a tokio interval completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let (transition, state) = {
                    let mut playback = playback.lock().await;
                    let transition = playback.tick(increment);
                    (transition, playback.state())
                };
                if let Some(story_id) = transition.mark_viewed {
                    record_transition("auto_advance");
                    spawn_view_mark(Arc::clone(&store), story_id);
                }
                if state.is_closed() {
                    record_transition("auto_close");
                    break;
                }
            }
        }));
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for StorySession {
    fn drop(&mut self) {
        // a ticker must never outlive its viewer
        self.stop_ticker();
    }
}

fn record_transition(transition: &str) {
    crate::metrics::PLAYBACK_TRANSITIONS_TOTAL
        .with_label_values(&[transition])
        .inc();
}

/// Record a view without blocking playback. Failures are swallowed:
/// a missed view mark must not interrupt the viewer.
fn spawn_view_mark(store: Arc<StoryStore>, story_id: RecordId) {
    tokio::spawn(async move {
        match store.mark_as_viewed(story_id).await {
            Ok(_) => {
                crate::metrics::STORY_VIEWS_TOTAL
                    .with_label_values(&["ok"])
                    .inc();
            }
            Err(error) => {
                crate::metrics::STORY_VIEWS_TOTAL
                    .with_label_values(&["dropped"])
                    .inc();
                tracing::debug!(story = story_id, %error, "view mark dropped");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BlobStore, Latency, MemoryBlobStore, NewStory, StoryKind};

    async fn story_store_with(n: usize) -> (Arc<StoryStore>, Vec<Story>) {
        let backend = Arc::new(MemoryBlobStore::new());
        backend.write("test_stories", "[]").await.unwrap();
        let store = Arc::new(
            StoryStore::open(backend, "test", Latency::disabled())
                .await
                .unwrap(),
        );
        let mut stories = Vec::new();
        for i in 0..n {
            stories.push(
                store
                    .create(NewStory {
                        content: format!("story {i}"),
                        kind: Some(StoryKind::Text),
                        user_id: Some("2".to_string()),
                    })
                    .await
                    .unwrap(),
            );
        }
        (store, stories)
    }

    fn viewer_user() -> User {
        User {
            id: 2,
            username: "maya_trails".to_string(),
            bio: String::new(),
            profile_pic: String::new(),
            followers: 0,
            following: 0,
        }
    }

    fn fast_settings() -> PlaybackConfig {
        PlaybackConfig {
            tick_ms: 100,
            story_duration_ms: 500,
        }
    }

    /// Let spawned view-mark tasks run to completion under paused time.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn auto_advance_walks_all_stories_and_closes() {
        let (store, stories) = story_store_with(2).await;
        let mut session = StorySession::open(
            viewer_user(),
            stories,
            Arc::clone(&store),
            fast_settings(),
        )
        .unwrap();

        assert!(session.state().await.is_playing());

        // one story lasts 500ms; run both to completion
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(session.state().await.is_closed());

        // both stories were marked viewed through the store
        let all = store.get_all().await.unwrap();
        assert!(all.iter().all(|s| s.viewed));
        session.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn pause_holds_progress_and_resume_continues() {
        let (store, stories) = story_store_with(1).await;
        let mut session =
            StorySession::open(viewer_user(), stories, store, fast_settings()).unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;
        let paused = session.pause().await;
        let held = paused.progress().unwrap();
        assert!(held > 0.0 && held < 100.0);

        // time passes while paused; progress must not move
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(session.state().await.progress(), Some(held));

        let resumed = session.resume().await;
        assert_eq!(resumed.progress(), Some(held));

        // the remainder of the duration closes the single-story viewer
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(session.state().await.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_navigation_marks_each_story_once() {
        let (store, stories) = story_store_with(3).await;
        let mut session = StorySession::open(
            viewer_user(),
            stories,
            Arc::clone(&store),
            fast_settings(),
        )
        .unwrap();

        session.next().await;
        session.previous().await;
        session.next().await;
        let state = session.next().await;
        assert_eq!(state.index(), Some(2));
        settle().await;

        let all: Vec<Story> = store.get_all().await.unwrap();
        assert!(all.iter().all(|s| s.viewed));

        session.close().await;
        assert!(session.state().await.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_next_at_last_story_closes() {
        let (store, stories) = story_store_with(1).await;
        let mut session =
            StorySession::open(viewer_user(), stories, store, fast_settings()).unwrap();

        let state = session.next().await;
        assert!(state.is_closed());

        // close is terminal and idempotent
        assert!(session.next().await.is_closed());
        assert!(session.close().await.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_story_mark_is_swallowed() {
        let (store, mut stories) = story_store_with(2).await;
        // second entry points at a record the store never had
        stories[1].id = 999;
        let mut session =
            StorySession::open(viewer_user(), stories, store, fast_settings()).unwrap();

        // advancing onto the dangling story must not error or stop playback
        let state = session.next().await;
        settle().await;
        assert_eq!(state.index(), Some(1));
        assert!(state.is_playing());
        session.close().await;
    }
}
