//! Story playback
//!
//! The viewer's state machine (`machine`, pure transition logic) and
//! its timer-driven wrapper (`session`, ticker task + view marks).

mod machine;
mod session;

pub use machine::{Playback, PlaybackState, Transition};
pub use session::StorySession;
