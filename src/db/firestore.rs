// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing [`DocumentStore`].
//!
//! Provides:
//! - Newest-first feed pages with `startAfter` cursors
//! - Live first pages driven by Firestore listen targets
//! - Post and favorite creation with generated document IDs
//! - User profiles for search

use crate::db::{
    collections, DocumentStore, FeedQuery, NewItem, OrderKey, SnapshotSender, Subscription,
};
use crate::error::{AppError, Result};
use crate::models::{FeedCursor, FeedItem, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::select_builder::FirestoreSelectDocBuilder;
use firestore::{
    FirestoreListenEvent, FirestoreListener, FirestoreListenerParams, FirestoreListenerTarget,
    FirestoreMemListenStateStorage,
};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

const DEFAULT_LISTEN_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Each subscription owns its listener, so one target ID is enough.
const FIRST_PAGE_TARGET: FirestoreListenerTarget = FirestoreListenerTarget::new(1);

type FirstPageListener = FirestoreListener<firestore::FirestoreDb, FirestoreMemListenStateStorage>;
type ListenResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    listen_retry_delay: Duration,
}

/// Feed document as read back from `posts` or `favorites`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredItem {
    #[serde(alias = "_firestore_id")]
    id: Option<String>,
    #[serde(default)]
    image_url: String,
    #[serde(default)]
    caption: String,
    #[serde(default)]
    created_by: String,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    created_at_millis: Option<i64>,
}

impl StoredItem {
    /// Convert to a feed item; `None` if the document lacks an ID or a
    /// usable timestamp.
    fn into_feed_item(self) -> Option<FeedItem> {
        let id = self.id?;
        let created_at = self
            .created_at
            .or_else(|| self.created_at_millis.and_then(DateTime::from_timestamp_millis))?;

        Some(FeedItem {
            created_at_millis: self
                .created_at_millis
                .unwrap_or_else(|| created_at.timestamp_millis()),
            id,
            image_url: self.image_url,
            caption: self.caption,
            author_id: self.created_by,
            created_at,
        })
    }

    /// Position of this document in the query order, even when it cannot be
    /// shown.
    fn position(&self) -> Option<FeedCursor> {
        let created_at = self
            .created_at
            .or_else(|| self.created_at_millis.and_then(DateTime::from_timestamp_millis))?;
        Some(FeedCursor {
            id: self.id.clone().unwrap_or_default(),
            created_at,
            created_at_millis: self
                .created_at_millis
                .unwrap_or_else(|| created_at.timestamp_millis()),
        })
    }
}

/// Move the usable documents of one read into `items`.
///
/// Returns where to continue when the read was full but some documents were
/// skipped, so the page can be topped up to its requested length.
fn collect_page(docs: Vec<StoredItem>, want: usize, items: &mut Vec<FeedItem>) -> Option<FeedCursor> {
    let full = docs.len() >= want;
    let resume = docs.last().and_then(StoredItem::position);
    let mut skipped = 0;

    for doc in docs {
        match doc.into_feed_item() {
            Some(item) => items.push(item),
            None => skipped += 1,
        }
    }

    if skipped == 0 {
        return None;
    }
    tracing::warn!(skipped, "Skipped feed documents without id or timestamp");
    if full {
        resume
    } else {
        None
    }
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
            listen_retry_delay: DEFAULT_LISTEN_RETRY_DELAY,
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
            listen_retry_delay: DEFAULT_LISTEN_RETRY_DELAY,
        })
    }

    /// Create a disconnected client (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            listen_retry_delay: DEFAULT_LISTEN_RETRY_DELAY,
        }
    }

    /// Set how long a dropped listen stream waits before reconnecting.
    pub fn with_listen_retry_delay(mut self, delay: Duration) -> Self {
        self.listen_retry_delay = delay;
        self
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Feed Queries ────────────────────────────────────────────

    /// Filtered, newest-first select for `query`, limited to `limit` documents.
    fn feed_select<'a>(
        &'a self,
        query: &FeedQuery,
        limit: u32,
    ) -> Result<FirestoreSelectDocBuilder<'a, firestore::FirestoreDb>> {
        let filter = query.filter.clone();

        Ok(self
            .get_client()?
            .fluent()
            .select()
            .from(query.collection)
            .filter(move |q| {
                q.for_all([filter
                    .as_ref()
                    .and_then(|f| q.field(f.field).eq(f.value.clone()))])
            })
            .order_by([(
                query.order_key.field(),
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit))
    }

    /// Run one page of a feed query, optionally starting after `cursor`.
    ///
    /// Documents that cannot be shown are replaced by reading further, so a
    /// short page still means the end of the data.
    async fn query_page(
        &self,
        query: &FeedQuery,
        cursor: Option<&FeedCursor>,
    ) -> Result<Vec<FeedItem>> {
        let page_len = query.page_len();
        let mut items = Vec::with_capacity(page_len);
        let mut after = cursor.cloned();

        while items.len() < page_len {
            let want = page_len - items.len();
            let select = self.feed_select(query, want as u32)?;
            let select = match &after {
                Some(cursor) => select.start_at(firestore::FirestoreQueryCursor::AfterValue(vec![
                    cursor_value(query.order_key, cursor),
                ])),
                None => select,
            };

            let docs: Vec<StoredItem> = select
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            match collect_page(docs, want, &mut items) {
                Some(next) => after = Some(next),
                None => break,
            }
        }

        Ok(items)
    }

    /// Listen to the first page of `query`; every document change nudges
    /// `changes`.
    async fn listen_first_page(
        &self,
        query: &FeedQuery,
        changes: mpsc::UnboundedSender<()>,
    ) -> Result<FirstPageListener> {
        let mut listener = self
            .get_client()?
            .create_listener_with_params(
                FirestoreMemListenStateStorage::new(),
                FirestoreListenerParams::new().with_retry_delay(self.listen_retry_delay),
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.feed_select(query, query.page_size)?
            .listen()
            .add_target(FIRST_PAGE_TARGET, &mut listener)
            .map_err(|e| AppError::Database(e.to_string()))?;

        listener
            .start(move |event: FirestoreListenEvent| {
                let changes = changes.clone();
                async move {
                    if matches!(
                        event,
                        FirestoreListenEvent::DocumentChange(_)
                            | FirestoreListenEvent::DocumentDelete(_)
                            | FirestoreListenEvent::DocumentRemove(_)
                    ) {
                        // The subscription may already be gone.
                        let _ = changes.send(());
                    }
                    ListenResult::Ok(())
                }
            })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(listener)
    }

    /// Re-read the first page after each change and forward it.
    async fn forward_changes(
        self,
        query: FeedQuery,
        sender: SnapshotSender,
        mut changes: mpsc::UnboundedReceiver<()>,
        mut last_seen: Vec<(String, i64)>,
    ) {
        let mut failing = false;

        loop {
            tokio::select! {
                _ = sender.closed() => break,
                change = changes.recv() => {
                    if change.is_none() {
                        break;
                    }
                }
            }
            // One re-read covers a burst of changes.
            while changes.try_recv().is_ok() {}

            match self.query_page(&query, None).await {
                Ok(items) => {
                    failing = false;
                    let signature = page_signature(&items);
                    if signature != last_seen {
                        last_seen = signature;
                        if !sender.send(Ok(items)) {
                            break;
                        }
                    }
                }
                // Report only the first failure of a run.
                Err(e) if !failing => {
                    failing = true;
                    if !sender.send(Err(e)) {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "First-page re-read still failing");
                }
            }
        }

        tracing::debug!(collection = query.collection, "First-page listener stopped");
    }

    /// Insert a document with a generated ID and return the ID.
    async fn insert<T>(&self, collection: &str, record: &T) -> Result<String>
    where
        T: Serialize + Sync + Send,
        for<'de> T: Deserialize<'de>,
    {
        let stored: StoredItem = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .generate_document_id()
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        stored
            .id
            .ok_or_else(|| AppError::Database("Insert returned no document id".to_string()))
    }
}

/// Cursor value in the representation of the query's order key.
fn cursor_value(order_key: OrderKey, cursor: &FeedCursor) -> firestore::FirestoreValue {
    match order_key {
        OrderKey::CreatedAt => firestore::FirestoreTimestamp(cursor.created_at).into(),
        OrderKey::CreatedAtMillis => cursor.created_at_millis.into(),
    }
}

/// Identity of a page for change detection.
fn page_signature(items: &[FeedItem]) -> Vec<(String, i64)> {
    items
        .iter()
        .map(|item| (item.id.clone(), item.created_at_millis))
        .collect()
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    async fn subscribe_first_page(&self, query: &FeedQuery) -> Result<Subscription> {
        let initial = self.query_page(query, None).await?;
        let (sender, subscription) = Subscription::channel();
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();

        let mut listener = self.listen_first_page(query, changes_tx).await?;

        let last_seen = page_signature(&initial);
        sender.send(Ok(initial));

        let db = self.clone();
        let query = query.clone();
        tokio::spawn(async move {
            db.forward_changes(query, sender, changes_rx, last_seen).await;
            if let Err(e) = listener.shutdown().await {
                tracing::warn!(error = %e, "Failed to shut down first-page listener");
            }
        });

        Ok(subscription)
    }

    async fn fetch_first_page(&self, query: &FeedQuery) -> Result<Vec<FeedItem>> {
        self.query_page(query, None).await
    }

    async fn fetch_page_after(
        &self,
        query: &FeedQuery,
        cursor: &FeedCursor,
    ) -> Result<Vec<FeedItem>> {
        self.query_page(query, Some(cursor)).await
    }

    async fn create_item(&self, item: &NewItem) -> Result<String> {
        let id = match item {
            NewItem::Post(post) => self.insert(item.collection(), post).await?,
            NewItem::Favorite(favorite) => self.insert(item.collection(), favorite).await?,
        };
        tracing::info!(collection = item.collection(), id = %id, "Document created");
        Ok(id)
    }

    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn put_user(&self, profile: &UserProfile) -> Result<()> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.id)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn list_users(&self, limit: u32) -> Result<Vec<UserProfile>> {
        let stream = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .limit(limit)
            .obj::<UserProfile>()
            .stream_query_with_errors()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        stream
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
