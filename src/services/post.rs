// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Add-post flow.
//!
//! Steps:
//! 1. Require a signed-in user
//! 2. Validate the image and caption
//! 3. Upload the image to the blob store
//! 4. Create the post document
//! 5. Hand back the new item for optimistic display

use crate::auth::{IdentityProvider, SessionContext};
use crate::db::{DocumentStore, NewItem};
use crate::error::FeedError;
use crate::feed::FeedSynchronizer;
use crate::models::{FeedItem, NewPost, PostRecord};
use crate::storage::{post_image_path, BlobStore};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

pub struct PostService {
    db: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    session: SessionContext,
}

impl PostService {
    pub fn new(db: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>, session: SessionContext) -> Self {
        Self { db, blobs, session }
    }

    /// Publish a post and return it as a feed item.
    ///
    /// Nothing is written if the user is signed out or the input is
    /// invalid. If the upload fails no document is created.
    pub async fn publish(&self, post: NewPost) -> Result<FeedItem, FeedError> {
        let uid = self
            .session
            .current_user_id()
            .ok_or(FeedError::AuthRequired)?;

        if post.image.is_empty() {
            return Err(FeedError::Invalid("Please pick an image first.".to_string()));
        }
        post.validate()
            .map_err(|e| FeedError::Invalid(e.to_string()))?;

        let now = Utc::now();
        let path = post_image_path(&uid, now.timestamp_millis());
        let size = post.image.len();

        let image_url = self
            .blobs
            .upload_blob(&path, post.image, &post.content_type)
            .await
            .map_err(FeedError::from_upload)?;

        let item = NewItem::Post(PostRecord::new(&uid, image_url, post.caption, now));
        let id = self
            .db
            .create_item(&item)
            .await
            .map_err(FeedError::from_upload)?;

        tracing::info!(uid = %uid, id = %id, path = %path, size, "Post published");
        Ok(item.to_feed_item(&id))
    }

    /// Publish a post and show it at the head of `feed` right away.
    pub async fn publish_into(
        &self,
        post: NewPost,
        feed: &FeedSynchronizer,
    ) -> Result<FeedItem, FeedError> {
        let item = self.publish(post).await?;
        feed.append_local(item.clone())?;
        Ok(item)
    }
}
