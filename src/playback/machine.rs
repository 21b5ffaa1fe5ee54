//! Story playback state machine
//!
//! Pure transition logic for the story viewer: timed auto-advance,
//! manual navigation, pause-on-hover and view tracking. Runtime wiring
//! (the ticker task and the store write for view marks) lives in the
//! session module, so everything here is testable without a runtime.

use crate::data::{RecordId, Story};
use crate::error::AppError;

/// Viewer state
///
/// `Idle` is represented by not holding a `Playback` at all; a
/// constructed machine is already showing a story.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    /// Auto-advance running
    Playing { index: usize, progress: f32 },
    /// Hover suspended the ticker; index and progress are kept
    Paused { index: usize, progress: f32 },
    /// Viewer dismissed, terminal
    Closed,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Index of the story on screen, if the viewer is open.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Playing { index, .. } | Self::Paused { index, .. } => Some(*index),
            Self::Closed => None,
        }
    }

    /// Progress of the current story in percent, if the viewer is open.
    pub fn progress(&self) -> Option<f32> {
        match self {
            Self::Playing { progress, .. } | Self::Paused { progress, .. } => Some(*progress),
            Self::Closed => None,
        }
    }
}

/// Side effects a transition asks the caller to run.
#[derive(Debug, Default, PartialEq)]
pub struct Transition {
    /// Story to record as viewed; produced at most once per story per
    /// machine, including revisits via Previous
    pub mark_viewed: Option<RecordId>,
    /// The machine entered `Closed` during this transition
    pub closed: bool,
    /// Index or pause flag changed; a running ticker is stale
    pub restart_ticker: bool,
}

impl Transition {
    fn none() -> Self {
        Self::default()
    }
}

/// The playback machine over one user's story list.
#[derive(Debug)]
pub struct Playback {
    stories: Vec<Story>,
    state: PlaybackState,
}

impl Playback {
    /// Open a viewer over a story list, entering the first story.
    pub fn open(stories: Vec<Story>) -> Result<(Self, Transition), AppError> {
        if stories.is_empty() {
            return Err(AppError::Validation(
                "cannot open a story viewer without stories".to_string(),
            ));
        }
        let mut playback = Self {
            stories,
            state: PlaybackState::Closed,
        };
        let transition = playback.enter(0);
        Ok((playback, transition))
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// The story on screen, if the viewer is open.
    pub fn current_story(&self) -> Option<&Story> {
        self.state.index().map(|index| &self.stories[index])
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    /// Timed progress step; a no-op outside of Playing.
    ///
    /// Reaching full progress advances to the next story with progress
    /// zeroed, or closes the viewer after the last one.
    pub fn tick(&mut self, increment: f32) -> Transition {
        let PlaybackState::Playing { index, progress } = self.state else {
            return Transition::none();
        };
        let progress = progress + increment;
        if progress >= 100.0 {
            if index + 1 < self.stories.len() {
                self.enter(index + 1)
            } else {
                self.close()
            }
        } else {
            self.state = PlaybackState::Playing { index, progress };
            Transition::none()
        }
    }

    /// Manual advance; closes the viewer at the last story.
    pub fn next(&mut self) -> Transition {
        let Some(index) = self.state.index() else {
            return Transition::none();
        };
        if index + 1 < self.stories.len() {
            self.enter(index + 1)
        } else {
            self.close()
        }
    }

    /// Manual step back; a no-op at the first story.
    pub fn previous(&mut self) -> Transition {
        let Some(index) = self.state.index() else {
            return Transition::none();
        };
        if index > 0 {
            self.enter(index - 1)
        } else {
            Transition::none()
        }
    }

    /// Suspend the ticker, keeping index and progress.
    pub fn pause(&mut self) -> Transition {
        if let PlaybackState::Playing { index, progress } = self.state {
            self.state = PlaybackState::Paused { index, progress };
            Transition {
                restart_ticker: true,
                ..Transition::none()
            }
        } else {
            Transition::none()
        }
    }

    /// Resume from the held progress; never resets it.
    pub fn resume(&mut self) -> Transition {
        if let PlaybackState::Paused { index, progress } = self.state {
            self.state = PlaybackState::Playing { index, progress };
            Transition {
                restart_ticker: true,
                ..Transition::none()
            }
        } else {
            Transition::none()
        }
    }

    /// Dismiss the viewer from any state; idempotent.
    pub fn close(&mut self) -> Transition {
        if self.state.is_closed() {
            return Transition::none();
        }
        self.state = PlaybackState::Closed;
        Transition {
            closed: true,
            restart_ticker: true,
            ..Transition::none()
        }
    }

    /// Show a story, zeroing its progress, and report the view mark if
    /// it has not been seen in this or any earlier session.
    fn enter(&mut self, index: usize) -> Transition {
        self.state = PlaybackState::Playing {
            index,
            progress: 0.0,
        };
        let story = &mut self.stories[index];
        let mark_viewed = if story.viewed {
            None
        } else {
            story.viewed = true;
            Some(story.id)
        };
        Transition {
            mark_viewed,
            closed: false,
            restart_ticker: true,
        }
    }
}
