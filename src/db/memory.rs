// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Behaves like the hosted store as far as the feed core can observe:
//! newest-first ordering, strictly-after cursors, and a fresh first-page
//! snapshot pushed to every matching subscriber after each write. Tests use
//! the extra hooks to take the store offline, count page fetches and hold
//! page responses in flight.

use crate::db::{DocumentStore, FeedQuery, NewItem, SnapshotSender, Subscription};
use crate::error::{AppError, Result};
use crate::models::{FeedCursor, FeedItem, UserProfile};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;

/// In-memory document store with live subscriptions.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<MemState>,
    offline: AtomicBool,
    first_page_calls: AtomicUsize,
    page_calls: AtomicUsize,
    page_gate: Mutex<Option<Arc<Semaphore>>>,
}

#[derive(Default)]
struct MemState {
    /// Documents in insertion order
    docs: Vec<StoredDoc>,
    next_id: u64,
    users: BTreeMap<String, UserProfile>,
    subscribers: Vec<Subscriber>,
}

struct StoredDoc {
    id: String,
    seq: u64,
    item: NewItem,
}

struct Subscriber {
    query: FeedQuery,
    sender: SnapshotSender,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemState>> {
        self.inner
            .state
            .lock()
            .map_err(|_| AppError::Database("memory store lock poisoned".to_string()))
    }

    fn check_online(&self) -> Result<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(AppError::Database("Backend unavailable".to_string()));
        }
        Ok(())
    }

    /// Insert a document under a caller-chosen ID, notifying subscribers.
    pub fn insert_with_id(&self, id: &str, item: NewItem) -> Result<()> {
        let mut state = self.state()?;
        let seq = state.next_id;
        state.next_id += 1;
        state.docs.push(StoredDoc {
            id: id.to_string(),
            seq,
            item,
        });
        notify_subscribers(&mut state);
        Ok(())
    }

    /// Simulate losing (or regaining) the backend connection.
    ///
    /// While offline every call fails, and live subscribers receive an
    /// error event.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
        if offline {
            if let Ok(mut state) = self.state() {
                state.subscribers.retain(|sub| {
                    sub.sender
                        .send(Err(AppError::Database("Backend unavailable".to_string())))
                });
            }
        }
    }

    /// Number of one-shot first-page fetches served.
    pub fn first_page_calls(&self) -> usize {
        self.inner.first_page_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_page_after` calls received.
    pub fn page_calls(&self) -> usize {
        self.inner.page_calls.load(Ordering::SeqCst)
    }

    /// Number of live subscribers still connected.
    pub fn subscriber_count(&self) -> usize {
        self.state()
            .map(|mut state| {
                state.subscribers.retain(|sub| !sub.sender.is_closed());
                state.subscribers.len()
            })
            .unwrap_or(0)
    }

    /// Hold every later `fetch_page_after` until a permit is added to the
    /// returned semaphore.
    pub fn hold_pages(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        if let Ok(mut slot) = self.inner.page_gate.lock() {
            *slot = Some(gate.clone());
        }
        gate
    }

    /// Stop holding page fetches.
    pub fn release_pages(&self) {
        if let Ok(mut slot) = self.inner.page_gate.lock() {
            if let Some(gate) = slot.take() {
                gate.add_permits(Semaphore::MAX_PERMITS / 2);
            }
        }
    }

    fn page_gate(&self) -> Option<Arc<Semaphore>> {
        self.inner
            .page_gate
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().cloned())
    }
}

/// Documents matching `query`, newest first by its order key.
///
/// Ties on the sort key put the later write first.
fn ordered<'a>(docs: &'a [StoredDoc], query: &FeedQuery) -> Vec<&'a StoredDoc> {
    let mut matching: Vec<&StoredDoc> = docs
        .iter()
        .filter(|doc| doc.item.collection() == query.collection)
        .filter(|doc| match &query.filter {
            Some(filter) => doc.item.string_field(filter.field) == Some(filter.value.as_str()),
            None => true,
        })
        .collect();

    matching.sort_by(|a, b| {
        sort_millis(&b.item, query)
            .cmp(&sort_millis(&a.item, query))
            .then_with(|| b.seq.cmp(&a.seq))
    });
    matching
}

fn sort_millis(item: &NewItem, query: &FeedQuery) -> i64 {
    let cursor = item.to_feed_item("").cursor();
    query.order_key.cursor_millis(&cursor)
}

fn first_page(docs: &[StoredDoc], query: &FeedQuery) -> Vec<FeedItem> {
    ordered(docs, query)
        .into_iter()
        .take(query.page_len())
        .map(|doc| doc.item.to_feed_item(&doc.id))
        .collect()
}

fn page_after(docs: &[StoredDoc], query: &FeedQuery, cursor: &FeedCursor) -> Vec<FeedItem> {
    let ordered = ordered(docs, query);

    // Resume after the cursor document itself; if it has vanished, fall back
    // to the sort key.
    let start = match ordered.iter().position(|doc| doc.id == cursor.id) {
        Some(pos) => pos + 1,
        None => {
            let key = query.order_key.cursor_millis(cursor);
            ordered
                .iter()
                .position(|doc| sort_millis(&doc.item, query) < key)
                .unwrap_or(ordered.len())
        }
    };

    ordered
        .into_iter()
        .skip(start)
        .take(query.page_len())
        .map(|doc| doc.item.to_feed_item(&doc.id))
        .collect()
}

fn notify_subscribers(state: &mut MemState) {
    let MemState {
        docs, subscribers, ..
    } = state;
    subscribers.retain(|sub| sub.sender.send(Ok(first_page(docs.as_slice(), &sub.query))));
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn subscribe_first_page(&self, query: &FeedQuery) -> Result<Subscription> {
        self.check_online()?;
        let (sender, subscription) = Subscription::channel();

        let mut state = self.state()?;
        sender.send(Ok(first_page(&state.docs, query)));
        state.subscribers.push(Subscriber {
            query: query.clone(),
            sender,
        });

        tracing::debug!(collection = query.collection, "Memory store subscription added");
        Ok(subscription)
    }

    async fn fetch_first_page(&self, query: &FeedQuery) -> Result<Vec<FeedItem>> {
        self.inner.first_page_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let state = self.state()?;
        Ok(first_page(&state.docs, query))
    }

    async fn fetch_page_after(
        &self,
        query: &FeedQuery,
        cursor: &FeedCursor,
    ) -> Result<Vec<FeedItem>> {
        self.inner.page_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = self.page_gate() {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            permit.forget();
        }

        self.check_online()?;
        let state = self.state()?;
        Ok(page_after(&state.docs, query, cursor))
    }

    async fn create_item(&self, item: &NewItem) -> Result<String> {
        self.check_online()?;
        let mut state = self.state()?;
        let seq = state.next_id;
        state.next_id += 1;
        let id = format!("doc-{:06}", seq);
        state.docs.push(StoredDoc {
            id: id.clone(),
            seq,
            item: item.clone(),
        });
        notify_subscribers(&mut state);
        Ok(id)
    }

    async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>> {
        self.check_online()?;
        Ok(self.state()?.users.get(uid).cloned())
    }

    async fn put_user(&self, profile: &UserProfile) -> Result<()> {
        self.check_online()?;
        self.state()?
            .users
            .insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn list_users(&self, limit: u32) -> Result<Vec<UserProfile>> {
        self.check_online()?;
        Ok(self
            .state()?
            .users
            .values()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostRecord;
    use chrono::{Duration, TimeZone, Utc};

    fn seed(store: &MemoryStore, count: usize) {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        // p1 is newest, so insert oldest first.
        for n in (1..=count).rev() {
            let at = base - Duration::minutes(n as i64);
            let record = PostRecord::new("author", format!("https://img/{n}"), format!("c{n}"), at);
            store
                .insert_with_id(&format!("p{n}"), NewItem::Post(record))
                .unwrap();
        }
    }

    fn ids(items: &[FeedItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_pages_are_newest_first_and_strictly_after() {
        let store = MemoryStore::new();
        seed(&store, 7);
        let query = FeedQuery::home(5);

        let first = store.fetch_first_page(&query).await.unwrap();
        assert_eq!(ids(&first), vec!["p1", "p2", "p3", "p4", "p5"]);

        let cursor = first.last().unwrap().cursor();
        let next = store.fetch_page_after(&query, &cursor).await.unwrap();
        assert_eq!(ids(&next), vec!["p6", "p7"]);
    }

    #[tokio::test]
    async fn test_subscribers_get_snapshot_after_write() {
        let store = MemoryStore::new();
        seed(&store, 2);
        let query = FeedQuery::home(5);

        let mut sub = store.subscribe_first_page(&query).await.unwrap();
        let initial = sub.next().await.unwrap().unwrap();
        assert_eq!(initial.len(), 2);

        let record = PostRecord::new("author", "https://img/new".to_string(), String::new(), Utc::now());
        let id = store.create_item(&NewItem::Post(record)).await.unwrap();

        let snapshot = sub.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].id, id);
    }

    #[tokio::test]
    async fn test_dropping_subscription_unsubscribes() {
        let store = MemoryStore::new();
        let sub = store
            .subscribe_first_page(&FeedQuery::home(5))
            .await
            .unwrap();
        assert_eq!(store.subscriber_count(), 1);

        drop(sub);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_offline_store_fails_calls() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let err = store
            .fetch_first_page(&FeedQuery::home(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
