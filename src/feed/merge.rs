// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Merging live first-page snapshots with paged history.

use crate::models::FeedItem;
use std::collections::HashSet;

/// Stable sort, newest `created_at` first. Ties keep their current order.
pub fn sort_newest_first(items: &mut [FeedItem]) {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Replace the head of `current` with a fresh first-page `snapshot`.
///
/// Every item already held whose ID is not in the snapshot is kept after
/// it, so an item pushed out of page 1 by newer posts does not leave a gap
/// before the paged history.
pub fn merge_head(current: &[FeedItem], snapshot: Vec<FeedItem>) -> Vec<FeedItem> {
    let head_ids: HashSet<String> = snapshot.iter().map(|item| item.id.clone()).collect();

    let mut merged = snapshot;
    merged.extend(
        current
            .iter()
            .filter(|item| !head_ids.contains(&item.id))
            .cloned(),
    );
    sort_newest_first(&mut merged);
    merged
}

/// Append an older page, skipping IDs already present.
///
/// Returns how many items were appended.
pub fn append_page(items: &mut Vec<FeedItem>, page: Vec<FeedItem>) -> usize {
    let mut seen: HashSet<String> = items.iter().map(|item| item.id.clone()).collect();
    let before = items.len();

    for item in page {
        if seen.insert(item.id.clone()) {
            items.push(item);
        }
    }

    items.len() - before
}

/// Put `item` at the head, dropping any older copy with the same ID.
pub fn prepend(items: &mut Vec<FeedItem>, item: FeedItem) {
    items.retain(|existing| existing.id != item.id);
    items.insert(0, item);
}
