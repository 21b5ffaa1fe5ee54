//! Service layer
//!
//! Headless equivalents of the app's screens, composed over the entity
//! stores:
//! - `feed`: sorted post snapshot with optimistic toggles and comments
//! - `rail`: story carousel composition and viewer selection
//! - `search`: one query across users, captions and hashtags
//! - `profile`: the signed-in user's profile, posts and saved posts

pub mod feed;
pub mod profile;
pub mod rail;
pub mod search;

pub use feed::FeedSession;
pub use profile::ProfileService;
pub use rail::{RailEntry, Selection, StoryRail};
pub use search::{SearchResults, SearchService};
