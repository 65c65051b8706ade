// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feed synchronizer: one feed's list, kept current against the store.
//!
//! Lifecycle:
//! - `activate` loads the first page (live subscription or one-shot fetch)
//! - `load_more` appends the next older page
//! - `refresh` starts over from a fresh first page
//! - `append_local` shows a just-created item before the store reports it
//! - `deactivate` drops the subscription when the view loses focus
//! - `dispose` ends the synchronizer for good
//!
//! Every request carries the generation current when it started. Refresh,
//! deactivate and dispose bump the generation, so late responses are
//! dropped instead of applied.

use crate::auth::{IdentityProvider, SessionContext};
use crate::db::{DocumentStore, FeedQuery, SnapshotEvent, Subscription};
use crate::error::FeedError;
use crate::feed::state::{Applied, FeedState, FeedView};
use crate::feed::{FeedScope, SyncMode};
use crate::models::FeedItem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Keeps one feed in step with the document store.
pub struct FeedSynchronizer {
    store: Arc<dyn DocumentStore>,
    session: SessionContext,
    scope: FeedScope,
    mode: SyncMode,
    page_size: u32,
    shared: Arc<Shared>,
}

/// State reachable from the snapshot pump.
struct Shared {
    state: Mutex<FeedState>,
    changes: watch::Sender<FeedView>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &FeedState) {
        self.changes.send_replace(state.view());
    }

    fn stop_pump(&self) {
        let handle = self
            .pump
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    /// Apply one live delivery. Returns `false` once the pump should stop.
    fn apply_event(&self, scope: &FeedScope, generation: u64, event: SnapshotEvent) -> bool {
        let mut state = self.state();
        let applied = match event {
            Ok(items) => {
                tracing::debug!(feed = %scope, count = items.len(), "Live snapshot");
                state.apply_live_snapshot(generation, items)
            }
            Err(e) => {
                let err = FeedError::from_fetch(e);
                state.apply_failure(generation, scope.failure_notice(&err))
            }
        };

        match applied {
            Applied::Updated => {
                self.publish(&state);
                true
            }
            Applied::Stale => {
                tracing::debug!(feed = %scope, generation, "Dropped stale snapshot");
                false
            }
        }
    }
}

impl FeedSynchronizer {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        session: SessionContext,
        scope: FeedScope,
        mode: SyncMode,
        page_size: u32,
    ) -> Self {
        let state = FeedState::default();
        let (changes, _) = watch::channel(state.view());

        Self {
            store,
            session,
            scope,
            mode,
            page_size,
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                changes,
                pump: Mutex::new(None),
            }),
        }
    }

    pub fn scope(&self) -> &FeedScope {
        &self.scope
    }

    /// Current state for rendering.
    pub fn view(&self) -> FeedView {
        self.shared.state().view()
    }

    /// Receiver notified after every state change.
    pub fn watch(&self) -> watch::Receiver<FeedView> {
        self.shared.changes.subscribe()
    }

    /// Establish the first page; call whenever the view becomes active.
    ///
    /// Returns once the first page has been applied (or has failed). In live
    /// mode later snapshots keep arriving until `deactivate`.
    pub async fn activate(&self) -> Result<(), FeedError> {
        self.start_first_page(false).await
    }

    /// Reload from a fresh first page, dropping any older pages.
    ///
    /// Items stay visible until the new page arrives. A no-op once disposed.
    pub async fn refresh(&self) -> Result<(), FeedError> {
        match self.start_first_page(true).await {
            Err(FeedError::Disposed) => Ok(()),
            other => other,
        }
    }

    async fn start_first_page(&self, refresh: bool) -> Result<(), FeedError> {
        self.shared.stop_pump();

        let uid = self.session.current_user_id();
        let query = self.scope.query(uid.as_deref(), self.page_size);

        let generation = {
            let mut state = self.shared.state();
            if state.is_disposed() {
                return Err(FeedError::Disposed);
            }
            let generation = state.begin_first_page(query.clone(), refresh);
            self.shared.publish(&state);
            generation
        };

        tracing::debug!(
            feed = %self.scope,
            generation,
            refresh,
            mode = ?self.mode,
            "Loading first page"
        );

        let Some(query) = query else {
            let mut state = self.shared.state();
            if state.apply_signed_out(generation) == Applied::Updated {
                self.shared.publish(&state);
            }
            tracing::debug!(feed = %self.scope, "No session, feed left empty");
            return Ok(());
        };

        match self.mode {
            SyncMode::Live => self.subscribe(generation, &query).await,
            SyncMode::Polled => {
                let result = self.store.fetch_first_page(&query).await;
                self.settle_first_page(generation, result.map_err(FeedError::from_fetch))
            }
        }
    }

    async fn subscribe(&self, generation: u64, query: &FeedQuery) -> Result<(), FeedError> {
        let mut subscription = match self.store.subscribe_first_page(query).await {
            Ok(subscription) => subscription,
            Err(e) => return self.settle_first_page(generation, Err(FeedError::from_fetch(e))),
        };

        let first = match subscription.next().await {
            Some(Ok(items)) => Ok(items),
            Some(Err(e)) => Err(FeedError::from_fetch(e)),
            None => Err(FeedError::Transient("subscription closed".to_string())),
        };
        let outcome = self.settle_first_page(generation, first);

        // Keep listening after a failed first page too; the next good
        // snapshot brings the feed back to live.
        self.spawn_pump(generation, subscription);
        outcome
    }

    /// Apply a first-page result, returning the error to the caller.
    fn settle_first_page(
        &self,
        generation: u64,
        result: Result<Vec<FeedItem>, FeedError>,
    ) -> Result<(), FeedError> {
        let mut state = self.shared.state();
        match result {
            Ok(items) => {
                let count = items.len();
                match state.apply_first_page(generation, items) {
                    Applied::Updated => {
                        self.shared.publish(&state);
                        tracing::info!(
                            feed = %self.scope,
                            count,
                            exhausted = state.exhausted,
                            "First page loaded"
                        );
                    }
                    Applied::Stale => {
                        tracing::debug!(feed = %self.scope, generation, "Dropped stale first page");
                    }
                }
                Ok(())
            }
            Err(err) => {
                if state.apply_failure(generation, self.scope.failure_notice(&err))
                    == Applied::Stale
                {
                    tracing::debug!(feed = %self.scope, generation, "Dropped stale failure");
                    return Ok(());
                }
                self.shared.publish(&state);
                Err(err)
            }
        }
    }

    fn spawn_pump(&self, generation: u64, mut subscription: Subscription) {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let scope = self.scope.clone();

        let handle = tokio::spawn(async move {
            while let Some(event) = subscription.next().await {
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                if !shared.apply_event(&scope, generation, event) {
                    break;
                }
            }
            tracing::debug!(feed = %scope, generation, "Snapshot pump stopped");
        });

        let mut slot = self
            .shared
            .pump
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // A newer first page or a teardown may have run since this one
        // started. The slot then belongs to the newer generation.
        if self.shared.state().generation != generation {
            handle.abort();
            return;
        }
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Fetch and append the next older page.
    ///
    /// A no-op while a page is in flight, at end of data, before the first
    /// page, or after dispose.
    pub async fn load_more(&self) -> Result<(), FeedError> {
        let request = {
            let mut state = self.shared.state();
            match state.begin_load_more() {
                Some(request) => {
                    self.shared.publish(&state);
                    request
                }
                None => return Ok(()),
            }
        };

        tracing::debug!(
            feed = %self.scope,
            cursor = %request.cursor.id,
            generation = request.generation,
            "Loading older page"
        );

        let result = self
            .store
            .fetch_page_after(&request.query, &request.cursor)
            .await;

        let mut state = self.shared.state();
        let (applied, outcome) = match result {
            Ok(page) => {
                let count = page.len();
                let applied = state.finish_load_more(request.generation, page);
                if applied == Applied::Updated {
                    tracing::info!(
                        feed = %self.scope,
                        count,
                        total = state.items.len(),
                        exhausted = state.exhausted,
                        "Older page appended"
                    );
                }
                (applied, Ok(()))
            }
            Err(e) => {
                let err = FeedError::from_fetch(e);
                let applied =
                    state.fail_load_more(request.generation, self.scope.load_more_notice(&err));
                (applied, Err(err))
            }
        };

        // The pager is released either way, so always publish.
        self.shared.publish(&state);
        match applied {
            Applied::Updated => outcome,
            Applied::Stale => {
                tracing::debug!(
                    feed = %self.scope,
                    generation = request.generation,
                    "Dropped stale page"
                );
                Ok(())
            }
        }
    }

    /// Show a just-created item at the head of the list.
    ///
    /// The next snapshot or refresh replaces it with the stored copy.
    pub fn append_local(&self, item: FeedItem) -> Result<(), FeedError> {
        if self.session.current_user_id().is_none() {
            return Err(FeedError::AuthRequired);
        }

        let mut state = self.shared.state();
        if state.is_disposed() {
            return Ok(());
        }
        tracing::debug!(feed = %self.scope, id = %item.id, "Appending local item");
        state.append_local(item);
        self.shared.publish(&state);
        Ok(())
    }

    /// Drop the live subscription; state is kept for the next activate.
    pub fn deactivate(&self) {
        {
            let mut state = self.shared.state();
            state.teardown(false);
            self.shared.publish(&state);
        }
        self.shared.stop_pump();
        tracing::debug!(feed = %self.scope, "Deactivated");
    }

    /// Stop for good. Later calls are no-ops and nothing in flight lands.
    pub fn dispose(&self) {
        {
            let mut state = self.shared.state();
            if state.is_disposed() {
                return;
            }
            state.teardown(true);
            self.shared.publish(&state);
        }
        self.shared.stop_pump();
        tracing::debug!(feed = %self.scope, "Disposed");
    }
}

impl Drop for FeedSynchronizer {
    fn drop(&mut self) {
        self.dispose();
    }
}
