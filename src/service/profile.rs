//! Profile service
//!
//! The signed-in user's profile, their posts and their saved posts.

use std::sync::Arc;

use crate::data::{Post, PostStore, RecordId, User, UserPatch, UserStore};
use crate::error::AppError;

/// Profile screen operations over the user and post stores.
pub struct ProfileService {
    users: Arc<UserStore>,
    posts: Arc<PostStore>,
}

impl ProfileService {
    pub fn new(users: Arc<UserStore>, posts: Arc<PostStore>) -> Self {
        Self { users, posts }
    }

    /// The signed-in user's record.
    pub async fn current_user(&self) -> Result<User, AppError> {
        self.users
            .get_current_user()
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Update the signed-in user's profile.
    pub async fn update_profile(&self, patch: UserPatch) -> Result<User, AppError> {
        self.users.update_profile(patch).await
    }

    /// The user's own posts, newest first. Authors are matched against
    /// the stringified user id, the way posts record them.
    pub async fn posts_of(&self, user_id: RecordId) -> Result<Vec<Post>, AppError> {
        let key = user_id.to_string();
        let posts = self.posts.get_all().await?;
        Ok(posts.into_iter().filter(|p| p.user_id == key).collect())
    }

    /// The signed-in user's grid: profile plus their posts.
    pub async fn own_page(&self) -> Result<(User, Vec<Post>), AppError> {
        let user = self.current_user().await?;
        let posts = self.posts_of(user.id).await?;
        Ok((user, posts))
    }

    /// Posts the signed-in user bookmarked.
    pub async fn saved_posts(&self) -> Result<Vec<Post>, AppError> {
        self.posts.get_saved().await
    }

    /// Drop a post from the saved collection.
    pub async fn unsave(&self, post_id: RecordId) -> Result<Post, AppError> {
        self.posts.toggle_save(post_id).await
    }
}
