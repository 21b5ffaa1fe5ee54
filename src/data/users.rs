//! User store
//!
//! Profile records plus the current-user scalar key. Profile writes go
//! through typed patches; follower counts are fixture data only.

use std::sync::Arc;
use std::time::Instant;

use crate::data::blob::{BlobStore, load_collection, save_collection};
use crate::data::models::{RecordId, User, UserPatch};
use crate::data::{Latency, fixtures, observe_op};
use crate::error::AppError;

/// Current user when the scalar key is absent or unreadable
pub const DEFAULT_CURRENT_USER_ID: RecordId = 1;

/// User collection store
pub struct UserStore {
    backend: Arc<dyn BlobStore>,
    key: String,
    current_user_key: String,
    latency: Latency,
}

impl UserStore {
    /// Open the user store, seeding the collection and the current-user
    /// key on first access.
    pub async fn open(
        backend: Arc<dyn BlobStore>,
        namespace: &str,
        latency: Latency,
    ) -> Result<Self, AppError> {
        let store = Self {
            backend,
            key: format!("{namespace}_users"),
            current_user_key: format!("{namespace}_current_user"),
            latency,
        };
        store.seed().await?;
        Ok(store)
    }

    async fn seed(&self) -> Result<(), AppError> {
        if self.backend.read(&self.key).await?.is_none() {
            let records: Vec<User> = fixtures::parse("users", fixtures::USERS);
            let source = if records.is_empty() { "empty" } else { "fixture" };
            self.persist(&records).await?;
            crate::metrics::STORE_SEEDS_TOTAL
                .with_label_values(&["users", source])
                .inc();
            tracing::info!(records = records.len(), "Seeded users collection");
        }

        if self.backend.read(&self.current_user_key).await?.is_none() {
            self.backend
                .write(&self.current_user_key, &DEFAULT_CURRENT_USER_ID.to_string())
                .await?;
        }

        Ok(())
    }

    async fn records(&self) -> Result<Vec<User>, AppError> {
        load_collection(self.backend.as_ref(), &self.key).await
    }

    async fn persist(&self, records: &[User]) -> Result<(), AppError> {
        save_collection(self.backend.as_ref(), &self.key, records).await?;
        crate::metrics::RECORDS_TOTAL
            .with_label_values(&["users"])
            .set(records.len() as i64);
        Ok(())
    }

    /// All users, in storage order.
    pub async fn get_all(&self) -> Result<Vec<User>, AppError> {
        let started = Instant::now();
        self.latency.scan().await;
        let users = self.records().await?;
        observe_op("users", "get_all", started);
        Ok(users)
    }

    /// Look up one user by id.
    pub async fn get_by_id(&self, id: RecordId) -> Result<Option<User>, AppError> {
        let started = Instant::now();
        self.latency.fetch().await;
        let user = self.records().await?.into_iter().find(|u| u.id == id);
        observe_op("users", "get_by_id", started);
        Ok(user)
    }

    /// The signed-in user's id from the scalar key.
    ///
    /// An unreadable value recovers to the default instead of poisoning
    /// every profile read.
    pub async fn current_user_id(&self) -> Result<RecordId, AppError> {
        match self.backend.read(&self.current_user_key).await? {
            Some(raw) => match raw.trim().parse() {
                Ok(id) => Ok(id),
                Err(_) => {
                    tracing::warn!(
                        key = %self.current_user_key,
                        value = %raw,
                        "current user key is unreadable; falling back to default"
                    );
                    Ok(DEFAULT_CURRENT_USER_ID)
                }
            },
            None => Ok(DEFAULT_CURRENT_USER_ID),
        }
    }

    /// The signed-in user's record.
    pub async fn get_current_user(&self) -> Result<Option<User>, AppError> {
        self.latency.fetch().await;
        let id = self.current_user_id().await?;
        self.get_by_id(id).await
    }

    /// Merge a patch over an existing user. The id is immutable.
    pub async fn update(&self, id: RecordId, patch: UserPatch) -> Result<User, AppError> {
        let started = Instant::now();
        self.latency.scan().await;

        let mut users = self.records().await?;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AppError::NotFound)?;
        user.apply(patch);
        let updated = user.clone();
        self.persist(&users).await?;
        observe_op("users", "update", started);
        Ok(updated)
    }

    /// Update the signed-in user's profile.
    pub async fn update_profile(&self, patch: UserPatch) -> Result<User, AppError> {
        let id = self.current_user_id().await?;
        self.update(id, patch).await
    }

    /// Users whose username or bio contains the query, case-insensitive.
    pub async fn search(&self, query: &str) -> Result<Vec<User>, AppError> {
        let started = Instant::now();
        self.latency.scan().await;
        let needle = query.to_lowercase();
        let matches = self
            .records()
            .await?
            .into_iter()
            .filter(|u| {
                u.username.to_lowercase().contains(&needle)
                    || u.bio.to_lowercase().contains(&needle)
            })
            .collect();
        observe_op("users", "search", started);
        Ok(matches)
    }
}
