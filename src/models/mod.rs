// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod favorite;
pub mod post;
pub mod user;

pub use favorite::FavoriteItem;
pub use post::{FeedCursor, FeedItem, NewPost, PostRecord};
pub use user::{AuthUser, UserProfile};
