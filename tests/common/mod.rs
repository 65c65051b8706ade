// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, Duration, TimeZone, Utc};
use lumigram::auth::SessionContext;
use lumigram::db::{FirestoreDb, MemoryStore, NewItem};
use lumigram::feed::{FeedScope, FeedSynchronizer, FeedView, SyncMode};
use lumigram::models::{AuthUser, PostRecord};
use std::sync::Arc;
use tokio::sync::watch;

/// Page size used by every feed test.
#[allow(dead_code)]
pub const PAGE_SIZE: u32 = 5;

/// User ID of the signed-in test session.
#[allow(dead_code)]
pub const TEST_UID: &str = "uid-test";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Creation time of seeded post `p{n}`. Smaller `n` is newer, so `p0`
/// sorts before `p1`.
#[allow(dead_code)]
pub fn seeded_at(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() - Duration::minutes(n)
}

/// Insert post `p{n}` written by `author`.
#[allow(dead_code)]
pub fn insert_post(store: &MemoryStore, n: i64, author: &str) {
    let record = PostRecord::new(
        author,
        format!("https://img.example/{n}.jpg"),
        format!("caption {n}"),
        seeded_at(n),
    );
    store
        .insert_with_id(&format!("p{n}"), NewItem::Post(record))
        .expect("insert seeded post");
}

/// Store holding posts `p1..=p{count}`, `p1` newest.
#[allow(dead_code)]
pub fn seeded_store(count: i64) -> MemoryStore {
    let store = MemoryStore::new();
    for n in (1..=count).rev() {
        insert_post(&store, n, "author-1");
    }
    store
}

#[allow(dead_code)]
pub fn signed_in() -> SessionContext {
    SessionContext::signed_in(AuthUser::local(TEST_UID))
}

/// Synchronizer over `store` with the test page size.
#[allow(dead_code)]
pub fn feed(
    store: &MemoryStore,
    session: &SessionContext,
    scope: FeedScope,
    mode: SyncMode,
) -> Arc<FeedSynchronizer> {
    Arc::new(FeedSynchronizer::new(
        Arc::new(store.clone()),
        session.clone(),
        scope,
        mode,
        PAGE_SIZE,
    ))
}

/// IDs of the feed items, in order.
#[allow(dead_code)]
pub fn ids(view: &FeedView) -> Vec<String> {
    view.items.iter().map(|item| item.id.clone()).collect()
}

/// `["p{from}", ..., "p{to}"]`
#[allow(dead_code)]
pub fn post_ids(from: i64, to: i64) -> Vec<String> {
    (from..=to).map(|n| format!("p{n}")).collect()
}

/// Assert the feed is newest first with no repeated IDs.
#[allow(dead_code)]
pub fn assert_ordered_and_unique(view: &FeedView) {
    let mut seen = std::collections::HashSet::new();
    for item in &view.items {
        assert!(seen.insert(item.id.clone()), "duplicate id {}", item.id);
    }
    for pair in view.items.windows(2) {
        assert!(
            pair[0].created_at >= pair[1].created_at,
            "{} is older than {}",
            pair[0].id,
            pair[1].id
        );
    }
}

/// Wait (bounded) until the feed reaches a state matching `pred`.
#[allow(dead_code)]
pub async fn wait_for_view(
    rx: &mut watch::Receiver<FeedView>,
    pred: impl FnMut(&FeedView) -> bool,
) -> FeedView {
    let view = tokio::time::timeout(std::time::Duration::from_secs(2), rx.wait_for(pred))
        .await
        .expect("timed out waiting for feed state")
        .expect("feed dropped");
    view.clone()
}

/// Wait (bounded) until `cond` holds.
#[allow(dead_code)]
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(std::time::Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("timed out waiting for condition");
}
