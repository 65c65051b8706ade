// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Post model: the feed item shown in every feed, and its stored form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One entry of a feed.
///
/// The same type is used whether the item came from the document store or
/// was synthesized locally right after a successful post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// Document ID assigned by the store
    pub id: String,
    /// Download URL of the image in the blob store
    pub image_url: String,
    /// Caption text
    pub caption: String,
    /// User who created the post
    pub author_id: String,
    /// Sort key
    pub created_at: DateTime<Utc>,
    /// Millisecond shadow of `created_at`, used as a cursor value
    pub created_at_millis: i64,
}

impl FeedItem {
    /// Cursor pointing just past this item.
    pub fn cursor(&self) -> FeedCursor {
        FeedCursor {
            id: self.id.clone(),
            created_at: self.created_at,
            created_at_millis: self.created_at_millis,
        }
    }
}

/// Opaque pointer to the last item of a page.
///
/// Holds both sort-key representations so the store can page on whichever
/// field the query orders by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCursor {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub created_at_millis: i64,
}

/// Post document as stored in the `posts` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub image_url: String,
    pub caption: String,
    pub created_by: String,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    pub created_at_millis: i64,
}

impl PostRecord {
    pub fn new(author_id: &str, image_url: String, caption: String, now: DateTime<Utc>) -> Self {
        Self {
            image_url,
            caption,
            created_by: author_id.to_string(),
            created_at: now,
            created_at_millis: now.timestamp_millis(),
        }
    }

    /// View this record as a feed item with the given document ID.
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

/// Input to the add-post flow.
#[derive(Debug, Clone, Validate)]
pub struct NewPost {
    /// Encoded image bytes (JPEG from the picker)
    pub image: Vec<u8>,
    pub content_type: String,
    #[validate(length(max = 2200))]
    pub caption: String,
}

impl NewPost {
    /// A JPEG post, which is what the image picker produces.
    pub fn jpeg(image: Vec<u8>, caption: impl Into<String>) -> Self {
        Self {
            image,
            content_type: "image/jpeg".to_string(),
            caption: caption.into(),
        }
    }
}
