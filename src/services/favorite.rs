// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Favoriting posts.

use crate::auth::{IdentityProvider, SessionContext};
use crate::db::{DocumentStore, NewItem};
use crate::error::FeedError;
use crate::models::{FavoriteItem, FeedItem};
use chrono::Utc;
use std::sync::Arc;

pub struct FavoriteService {
    db: Arc<dyn DocumentStore>,
    session: SessionContext,
}

impl FavoriteService {
    pub fn new(db: Arc<dyn DocumentStore>, session: SessionContext) -> Self {
        Self { db, session }
    }

    /// Favorite `post` for the signed-in user.
    ///
    /// Returns the entry as it will appear in the favorites feed.
    pub async fn favorite(&self, post: &FeedItem) -> Result<FeedItem, FeedError> {
        let uid = self
            .session
            .current_user_id()
            .ok_or(FeedError::AuthRequired)?;

        let item = NewItem::Favorite(FavoriteItem::for_post(&uid, post, Utc::now()));
        let id = self
            .db
            .create_item(&item)
            .await
            .map_err(FeedError::from_fetch)?;

        tracing::info!(uid = %uid, post_id = %post.id, id = %id, "Post favorited");
        Ok(item.to_feed_item(&id))
    }
}
