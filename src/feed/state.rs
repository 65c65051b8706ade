// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Synchronizer state and its transitions.
//!
//! Everything here is synchronous; the async synchronizer calls these
//! methods while holding its state lock and never awaits in between.

use crate::db::FeedQuery;
use crate::error::Notice;
use crate::feed::merge;
use crate::models::{FeedCursor, FeedItem};
use serde::Serialize;

/// Position in the synchronizer state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedPhase {
    /// Not subscribed (never activated, or deactivated)
    Idle,
    /// First page requested
    Subscribing,
    /// Steady state
    Live,
    /// Load-more in flight
    Paginating,
    /// Refresh in flight
    Refreshing,
    /// First page could not be loaded
    Failed,
    /// Terminal
    Disposed,
}

/// Immutable snapshot of a feed for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedView {
    pub items: Vec<FeedItem>,
    pub cursor: Option<FeedCursor>,
    pub exhausted: bool,
    pub busy: bool,
    pub refreshing: bool,
    pub phase: FeedPhase,
    /// Last user-visible problem, cleared by the next successful load
    pub notice: Option<Notice>,
}

/// Result of applying a delivery to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// State changed
    Updated,
    /// Delivery belonged to an older generation and was dropped
    Stale,
}

/// Work order for a load-more call.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub generation: u64,
    pub query: FeedQuery,
    pub cursor: FeedCursor,
}

#[derive(Debug)]
pub struct FeedState {
    pub items: Vec<FeedItem>,
    pub cursor: Option<FeedCursor>,
    pub exhausted: bool,
    pub busy: bool,
    pub refreshing: bool,
    /// An older page has been appended since the last first-page load
    pub paged: bool,
    pub phase: FeedPhase,
    /// Bumped by refresh, deactivate and dispose to invalidate in-flight work
    pub generation: u64,
    /// Query of the current generation
    pub query: Option<FeedQuery>,
    pub notice: Option<Notice>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
            exhausted: false,
            busy: false,
            refreshing: false,
            paged: false,
            phase: FeedPhase::Idle,
            generation: 0,
            query: None,
            notice: None,
        }
    }
}

impl FeedState {
    pub fn view(&self) -> FeedView {
        FeedView {
            items: self.items.clone(),
            cursor: self.cursor.clone(),
            exhausted: self.exhausted,
            busy: self.busy,
            refreshing: self.refreshing,
            phase: self.phase,
            notice: self.notice.clone(),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.phase == FeedPhase::Disposed
    }

    /// Start loading the first page under a new generation.
    ///
    /// The cursor and the end-of-data flag are dropped right away; items stay
    /// visible until the new page lands.
    pub fn begin_first_page(&mut self, query: Option<FeedQuery>, refresh: bool) -> u64 {
        self.generation += 1;
        self.query = query;
        self.cursor = None;
        self.exhausted = false;
        if refresh {
            self.refreshing = true;
            self.phase = FeedPhase::Refreshing;
        } else {
            self.phase = FeedPhase::Subscribing;
        }
        self.generation
    }

    /// Replace the list with a first page.
    pub fn apply_first_page(&mut self, generation: u64, page: Vec<FeedItem>) -> Applied {
        if generation != self.generation || self.is_disposed() {
            return Applied::Stale;
        }

        let page_len = self.page_len();
        self.exhausted = page.len() < page_len;
        self.items = page;
        merge::sort_newest_first(&mut self.items);
        self.cursor = self.items.last().map(FeedItem::cursor);
        self.paged = false;
        self.refreshing = false;
        self.notice = None;
        if !self.busy {
            self.phase = FeedPhase::Live;
        } else {
            self.phase = FeedPhase::Paginating;
        }
        Applied::Updated
    }

    /// Settle a feed that has nothing to show without a session.
    pub fn apply_signed_out(&mut self, generation: u64) -> Applied {
        if generation != self.generation || self.is_disposed() {
            return Applied::Stale;
        }
        self.items.clear();
        self.cursor = None;
        self.exhausted = true;
        self.paged = false;
        self.refreshing = false;
        self.notice = None;
        self.phase = FeedPhase::Live;
        Applied::Updated
    }

    /// Apply a later snapshot from a live subscription.
    ///
    /// Until an older page has been appended this is a plain replacement.
    /// Afterwards, or while an older page is in flight, only the head is
    /// replaced and the held tail is kept so the pending page still lines up.
    pub fn apply_live_snapshot(&mut self, generation: u64, snapshot: Vec<FeedItem>) -> Applied {
        if !self.paged && !self.busy {
            return self.apply_first_page(generation, snapshot);
        }
        if generation != self.generation || self.is_disposed() {
            return Applied::Stale;
        }

        self.items = merge::merge_head(&self.items, snapshot);
        self.cursor = self.items.last().map(FeedItem::cursor);
        self.notice = None;
        if self.phase == FeedPhase::Failed {
            self.phase = if self.busy {
                FeedPhase::Paginating
            } else {
                FeedPhase::Live
            };
        }
        Applied::Updated
    }

    /// Record a failed first page or subscription error.
    pub fn apply_failure(&mut self, generation: u64, notice: Notice) -> Applied {
        if generation != self.generation || self.is_disposed() {
            return Applied::Stale;
        }
        self.refreshing = false;
        self.phase = FeedPhase::Failed;
        self.notice = Some(notice);
        Applied::Updated
    }

    /// Claim the pager, or `None` if load-more must be a no-op.
    pub fn begin_load_more(&mut self) -> Option<PageRequest> {
        if self.busy || self.exhausted || self.is_disposed() {
            return None;
        }
        let cursor = self.cursor.clone()?;
        let query = self.query.clone()?;

        self.busy = true;
        if self.phase == FeedPhase::Live {
            self.phase = FeedPhase::Paginating;
        }
        Some(PageRequest {
            generation: self.generation,
            query,
            cursor,
        })
    }

    /// Complete a load-more. The pager is released even when the page is
    /// stale.
    pub fn finish_load_more(&mut self, generation: u64, page: Vec<FeedItem>) -> Applied {
        self.release_pager();
        if generation != self.generation || self.is_disposed() {
            return Applied::Stale;
        }

        let short = page.len() < self.page_len();
        merge::append_page(&mut self.items, page);
        self.cursor = self.items.last().map(FeedItem::cursor);
        self.paged = true;
        self.notice = None;
        if short {
            self.exhausted = true;
        }
        Applied::Updated
    }

    /// Complete a load-more that failed.
    pub fn fail_load_more(&mut self, generation: u64, notice: Notice) -> Applied {
        self.release_pager();
        if generation != self.generation || self.is_disposed() {
            return Applied::Stale;
        }
        self.notice = Some(notice);
        Applied::Updated
    }

    fn release_pager(&mut self) {
        self.busy = false;
        if self.phase == FeedPhase::Paginating {
            self.phase = FeedPhase::Live;
        }
    }

    /// Show a locally created item at the head right away.
    ///
    /// The cursor is re-derived from the tail and end-of-data is cleared, so
    /// the next load-more asks the store again.
    pub fn append_local(&mut self, item: FeedItem) {
        merge::prepend(&mut self.items, item);
        self.cursor = self.items.last().map(FeedItem::cursor);
        self.exhausted = false;
    }

    /// Invalidate everything in flight and leave the live state.
    pub fn teardown(&mut self, dispose: bool) {
        self.generation += 1;
        self.refreshing = false;
        if dispose {
            self.phase = FeedPhase::Disposed;
        } else if !self.is_disposed() {
            self.phase = FeedPhase::Idle;
        }
    }

    fn page_len(&self) -> usize {
        self.query.as_ref().map(FeedQuery::page_len).unwrap_or(0)
    }
}
