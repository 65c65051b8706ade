// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Paginated, live-updating feeds.
//!
//! A [`FeedSynchronizer`] keeps one feed's in-memory list in step with the
//! document store: the newest page arrives from a live subscription (or a
//! one-shot fetch in polled mode) and older pages are fetched on demand.

pub mod merge;
pub mod state;
pub mod synchronizer;

pub use state::{FeedPhase, FeedView};
pub use synchronizer::FeedSynchronizer;

use crate::db::FeedQuery;
use crate::error::{FeedError, Notice};
use std::fmt;
use std::str::FromStr;

/// How a feed keeps its first page current.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// Live subscription; snapshots are pushed on every change.
    #[default]
    Live,
    /// One-shot fetch on activate and refresh only.
    Polled,
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(SyncMode::Live),
            "polled" => Ok(SyncMode::Polled),
            other => Err(format!("unknown sync mode {:?}", other)),
        }
    }
}

/// Which items a feed shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    /// Every post
    Home,
    /// The signed-in user's favorites
    Favorites,
    /// Posts created by the given user
    Profile(String),
    /// Posts created by the signed-in user
    OwnProfile,
}

impl FeedScope {
    /// Query for this scope, or `None` when it needs a session and there is
    /// none.
    pub fn query(&self, session_uid: Option<&str>, page_size: u32) -> Option<FeedQuery> {
        match self {
            FeedScope::Home => Some(FeedQuery::home(page_size)),
            FeedScope::Favorites => session_uid.map(|uid| FeedQuery::favorites(uid, page_size)),
            FeedScope::Profile(uid) => Some(FeedQuery::profile(uid, page_size)),
            FeedScope::OwnProfile => session_uid.map(|uid| FeedQuery::profile(uid, page_size)),
        }
    }

    /// What the feed lists, as used in user-facing messages.
    pub fn noun(&self) -> &'static str {
        match self {
            FeedScope::Favorites => "favorites",
            _ => "posts",
        }
    }

    /// Notice for a failed load of this feed.
    pub fn failure_notice(&self, err: &FeedError) -> Notice {
        match err {
            FeedError::Transient(_) => {
                Notice::new("Error", format!("Could not load {}.", self.noun()))
            }
            other => other.notice(),
        }
    }

    /// Notice for a failed older page of this feed.
    pub fn load_more_notice(&self, err: &FeedError) -> Notice {
        match err {
            FeedError::Transient(_) => {
                Notice::new("Error", format!("Could not fetch more {}.", self.noun()))
            }
            other => other.notice(),
        }
    }
}

impl fmt::Display for FeedScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedScope::Home => write!(f, "home"),
            FeedScope::Favorites => write!(f, "favorites"),
            FeedScope::Profile(uid) => write!(f, "profile:{}", uid),
            FeedScope::OwnProfile => write!(f, "own-profile"),
        }
    }
}
