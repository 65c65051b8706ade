// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Favorite model for the `favorites` collection.

use crate::models::FeedItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's favorite of a post.
///
/// Copies the post's display fields so the favorites feed renders without
/// a second lookup. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    /// Owner of the favorite
    pub user_id: String,
    /// ID of the favorited post
    pub post_id: String,
    pub image_url: String,
    pub caption: String,
    /// Author of the favorited post
    pub created_by: String,
    /// When the favorite was made (feed sort key)
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    pub created_at_millis: i64,
}

impl FavoriteItem {
    /// Favorite `post` on behalf of `user_id` at time `now`.
    pub fn for_post(user_id: &str, post: &FeedItem, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            post_id: post.id.clone(),
            image_url: post.image_url.clone(),
            caption: post.caption.clone(),
            created_by: post.author_id.clone(),
            created_at: now,
            created_at_millis: now.timestamp_millis(),
        }
    }

    /// View as an entry of the favorites feed, keyed by the favorite's own
    /// document ID.
    pub fn to_feed_item(&self, id: &str) -> FeedItem {
        FeedItem {
            id: id.to_string(),
            image_url: self.image_url.clone(),
            caption: self.caption.clone(),
            author_id: self.created_by.clone(),
            created_at: self.created_at,
            created_at_millis: self.created_at_millis,
        }
    }
}
