// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profiles: search, lookup and edit.

use crate::auth::{IdentityProvider, SessionContext};
use crate::db::DocumentStore;
use crate::error::FeedError;
use crate::models::UserProfile;
use std::sync::Arc;
use validator::Validate;

pub struct UserService {
    db: Arc<dyn DocumentStore>,
    session: SessionContext,
    search_limit: u32,
}

impl UserService {
    pub fn new(db: Arc<dyn DocumentStore>, session: SessionContext, search_limit: u32) -> Self {
        Self {
            db,
            session,
            search_limit,
        }
    }

    /// Profiles whose username contains `query`, ignoring case.
    ///
    /// An empty query matches everyone.
    pub async fn search(&self, query: &str) -> Result<Vec<UserProfile>, FeedError> {
        let needle = query.trim().to_lowercase();
        let users = self
            .db
            .list_users(self.search_limit)
            .await
            .map_err(FeedError::from_fetch)?;

        let mut matches: Vec<UserProfile> = users
            .into_iter()
            .filter(|user| user.username.to_lowercase().contains(&needle))
            .collect();
        matches.sort_by(|a, b| a.username.to_lowercase().cmp(&b.username.to_lowercase()));

        tracing::debug!(query = %needle, count = matches.len(), "User search");
        Ok(matches)
    }

    pub async fn profile(&self, uid: &str) -> Result<Option<UserProfile>, FeedError> {
        self.db.get_user(uid).await.map_err(FeedError::from_fetch)
    }

    /// Create or replace the signed-in user's profile.
    pub async fn save_profile(
        &self,
        username: &str,
        avatar_url: Option<String>,
    ) -> Result<UserProfile, FeedError> {
        let uid = self
            .session
            .current_user_id()
            .ok_or(FeedError::AuthRequired)?;
        self.put_profile(&uid, username, avatar_url).await
    }

    /// Write a profile for `uid` after validating it.
    pub(crate) async fn put_profile(
        &self,
        uid: &str,
        username: &str,
        avatar_url: Option<String>,
    ) -> Result<UserProfile, FeedError> {
        let profile = UserProfile {
            id: uid.to_string(),
            username: username.trim().to_string(),
            avatar_url,
        };
        profile
            .validate()
            .map_err(|e| FeedError::Invalid(e.to_string()))?;

        self.db
            .put_user(&profile)
            .await
            .map_err(FeedError::from_fetch)?;

        tracing::info!(uid = %uid, username = %profile.username, "Profile saved");
        Ok(profile)
    }
}
