//! Document store layer.
//!
//! [`DocumentStore`] is the port the feed core talks to. [`FirestoreDb`] is
//! the production backend; [`MemoryStore`] runs in-process for offline mode
//! and tests.

pub mod firestore;
pub mod memory;
pub mod query;
pub mod subscription;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryStore;
pub use query::{FeedQuery, FieldFilter, OrderKey};
pub use subscription::{SnapshotEvent, SnapshotSender, Subscription};

use crate::error::Result;
use crate::models::{FavoriteItem, FeedCursor, FeedItem, PostRecord, UserProfile};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const POSTS: &str = "posts";
    pub const FAVORITES: &str = "favorites";
    pub const USERS: &str = "users";
}

/// A document to be created; the kind selects the collection.
#[derive(Debug, Clone, PartialEq)]
pub enum NewItem {
    Post(PostRecord),
    Favorite(FavoriteItem),
}

impl NewItem {
    /// Collection the document is written to.
    pub fn collection(&self) -> &'static str {
        match self {
            NewItem::Post(_) => collections::POSTS,
            NewItem::Favorite(_) => collections::FAVORITES,
        }
    }

    /// View the document as a feed item once the store has assigned an ID.
    pub fn to_feed_item(&self, id: &str) -> FeedItem {
        match self {
            NewItem::Post(post) => post.to_feed_item(id),
            NewItem::Favorite(favorite) => favorite.to_feed_item(id),
        }
    }

    /// Value of a string field, by stored field name.
    pub fn string_field(&self, field: &str) -> Option<&str> {
        match (self, field) {
            (NewItem::Post(post), "createdBy") => Some(&post.created_by),
            (NewItem::Favorite(fav), "createdBy") => Some(&fav.created_by),
            (NewItem::Favorite(fav), "userId") => Some(&fav.user_id),
            (NewItem::Favorite(fav), "postId") => Some(&fav.post_id),
            _ => None,
        }
    }
}

/// Queryable, ordered, live-updatable collection service.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Watch the first page of `query`. The current page is delivered
    /// first, then a new snapshot after every change.
    async fn subscribe_first_page(&self, query: &FeedQuery) -> Result<Subscription>;

    /// One-shot fetch of the first page of `query`.
    async fn fetch_first_page(&self, query: &FeedQuery) -> Result<Vec<FeedItem>>;

    /// Fetch the page that starts strictly after `cursor`.
    async fn fetch_page_after(&self, query: &FeedQuery, cursor: &FeedCursor)
        -> Result<Vec<FeedItem>>;

    /// Create a document, returning its store-assigned ID.
    async fn create_item(&self, item: &NewItem) -> Result<String>;

    /// Get a user profile by user ID.
    async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>>;

    /// Create or replace a user profile.
    async fn put_user(&self, profile: &UserProfile) -> Result<()>;

    /// List up to `limit` user profiles.
    async fn list_users(&self, limit: u32) -> Result<Vec<UserProfile>>;
}
