//! Data models
//!
//! Rust structs for the persisted entity records. Field names are
//! serde-renamed to match the JSON layout of the stored collections
//! ("Id", "userId", "imageUrl", ...), and timestamps use chrono.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Type
// =============================================================================

/// Record identifier, assigned as `max(existing) + 1` within a collection
/// (1 for an empty collection).
pub type RecordId = u64;

/// Access to a record's identifier for the shared collection helpers.
pub trait Record {
    fn id(&self) -> RecordId;
}

/// Next identifier for a collection.
pub(crate) fn next_id<T: Record>(records: &[T]) -> RecordId {
    records.iter().map(Record::id).max().unwrap_or(0) + 1
}

// =============================================================================
// Post
// =============================================================================

/// A feed post
///
/// `comments` is the embedded list of comment ids seeded with the
/// record; the comment thread itself is always read from the comment
/// collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "Id")]
    pub id: RecordId,
    /// Author reference, stored as a string ("user1", "2"). Dangling
    /// references are tolerated and matched defensively by consumers.
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub caption: String,
    pub hashtags: Vec<String>,
    /// Like counter, flipped only through `toggle_like`
    pub likes: u32,
    pub comments: Vec<RecordId>,
    pub timestamp: DateTime<Utc>,
    /// Bookmark flag, flipped only through `toggle_save`
    pub saved: bool,
}

impl Record for Post {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// Caller-supplied fields for creating a post
///
/// Unspecified fields take the collection defaults (likes 0, saved
/// false, empty hashtags and comments, timestamp now).
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub image_url: String,
    pub caption: Option<String>,
    pub hashtags: Option<Vec<String>>,
    pub user_id: Option<String>,
}

/// Partial update for a post
///
/// The id is not representable here, so an update can never move a
/// record to a different identifier. Likes, saved and the comment list
/// are owned by their dedicated operations.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub image_url: Option<String>,
    pub caption: Option<String>,
    pub hashtags: Option<Vec<String>>,
}

impl Post {
    /// Merge a patch over this record, field by field.
    pub fn apply(&mut self, patch: PostPatch) {
        if let Some(image_url) = patch.image_url {
            self.image_url = image_url;
        }
        if let Some(caption) = patch.caption {
            self.caption = caption;
        }
        if let Some(hashtags) = patch.hashtags {
            self.hashtags = hashtags;
        }
    }
}

// =============================================================================
// Comment
// =============================================================================

/// A comment on a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "postId")]
    pub post_id: RecordId,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Record for Comment {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// Caller-supplied fields for creating a comment
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: RecordId,
    pub text: String,
    pub user_id: Option<String>,
}

// =============================================================================
// Story
// =============================================================================

/// An ephemeral story
///
/// Stories stay in storage past their display window; read paths filter
/// them out instead of deleting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Image URL or raw text, depending on `kind`
    pub content: String,
    #[serde(rename = "type")]
    pub kind: StoryKind,
    pub timestamp: DateTime<Utc>,
    /// Set once by `mark_as_viewed`, never cleared
    pub viewed: bool,
}

impl Record for Story {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl Story {
    /// Whether the story is still inside its 24 hour display window.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.timestamp) < chrono::Duration::hours(24)
    }
}

/// Story content kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryKind {
    Image,
    Text,
}

impl StoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Text => "text",
        }
    }
}

/// Caller-supplied fields for creating a story
#[derive(Debug, Clone)]
pub struct NewStory {
    pub content: String,
    pub kind: Option<StoryKind>,
    pub user_id: Option<String>,
}

// =============================================================================
// User
// =============================================================================

/// A profile record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub username: String,
    pub bio: String,
    #[serde(rename = "profilePic")]
    pub profile_pic: String,
    pub followers: u32,
    pub following: u32,
}

impl Record for User {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// Partial update for a profile
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
}

impl User {
    /// Merge a patch over this record, field by field.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(bio) = patch.bio {
            self.bio = bio;
        }
        if let Some(profile_pic) = patch.profile_pic {
            self.profile_pic = profile_pic;
        }
    }
}
