// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feed query description shared by every document store backend.

use crate::db::collections;
use crate::models::FeedCursor;

/// Field a feed is ordered by (always descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKey {
    /// Store timestamp field `createdAt`
    CreatedAt,
    /// Client millisecond field `createdAtMillis`
    CreatedAtMillis,
}

impl OrderKey {
    /// Stored field name.
    pub fn field(&self) -> &'static str {
        match self {
            OrderKey::CreatedAt => "createdAt",
            OrderKey::CreatedAtMillis => "createdAtMillis",
        }
    }

    /// Sort key value of a cursor in this ordering, in milliseconds.
    pub fn cursor_millis(&self, cursor: &FeedCursor) -> i64 {
        match self {
            OrderKey::CreatedAt => cursor.created_at.timestamp_millis(),
            OrderKey::CreatedAtMillis => cursor.created_at_millis,
        }
    }
}

/// Equality filter on a string field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: &'static str,
    pub value: String,
}

/// A paginated, newest-first query over one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub collection: &'static str,
    pub order_key: OrderKey,
    pub filter: Option<FieldFilter>,
    pub page_size: u32,
}

impl FeedQuery {
    /// Every post, newest first.
    pub fn home(page_size: u32) -> Self {
        Self {
            collection: collections::POSTS,
            order_key: OrderKey::CreatedAt,
            filter: None,
            page_size,
        }
    }

    /// A user's favorites, most recently favorited first.
    pub fn favorites(user_id: &str, page_size: u32) -> Self {
        Self {
            collection: collections::FAVORITES,
            order_key: OrderKey::CreatedAtMillis,
            filter: Some(FieldFilter {
                field: "userId",
                value: user_id.to_string(),
            }),
            page_size,
        }
    }

    /// Posts created by one user.
    pub fn profile(user_id: &str, page_size: u32) -> Self {
        Self {
            collection: collections::POSTS,
            order_key: OrderKey::CreatedAt,
            filter: Some(FieldFilter {
                field: "createdBy",
                value: user_id.to_string(),
            }),
            page_size,
        }
    }

    /// Page size as a slice length.
    pub fn page_len(&self) -> usize {
        self.page_size as usize
    }
}
