// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Lumigram: client core of a photo-sharing app
//!
//! This crate keeps paginated, live-updating feeds (home, favorites and
//! per-user profiles) in step with a hosted document store, and provides
//! the posting, favoriting, account and user-search flows around them.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

use auth::{AccountBackend, FirebaseAuthClient, MemoryAccounts, SessionContext};
use config::Config;
use db::{DocumentStore, FirestoreDb, MemoryStore};
use feed::{FeedScope, FeedSynchronizer};
use services::{AccountService, FavoriteService, PostService, UserService};
use std::sync::Arc;
use storage::{BlobStore, FirebaseStorage, MemoryBlobStore};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub accounts: Arc<dyn AccountBackend>,
    pub session: SessionContext,
}

impl AppState {
    /// Connect to the hosted backend described by `config`.
    pub async fn connect(config: Config) -> error::Result<Self> {
        let session = SessionContext::signed_out();
        let db = FirestoreDb::new(&config.project_id)
            .await?
            .with_listen_retry_delay(config.listen_retry_delay);
        let blobs = FirebaseStorage::from_env(config.storage_bucket.clone(), session.clone());
        let accounts = FirebaseAuthClient::from_env(config.api_key.clone());

        tracing::info!(
            project = %config.project_id,
            page_size = config.page_size,
            sync_mode = ?config.sync_mode,
            "Backend connected"
        );

        Ok(Self {
            config,
            db: Arc::new(db),
            blobs: Arc::new(blobs),
            accounts: Arc::new(accounts),
            session,
        })
    }

    /// Run entirely in process, with no backend.
    pub fn offline(config: Config) -> Self {
        Self {
            config,
            db: Arc::new(MemoryStore::new()),
            blobs: Arc::new(MemoryBlobStore::new()),
            accounts: Arc::new(MemoryAccounts::new()),
            session: SessionContext::signed_out(),
        }
    }

    pub fn feed(&self, scope: FeedScope) -> FeedSynchronizer {
        FeedSynchronizer::new(
            self.db.clone(),
            self.session.clone(),
            scope,
            self.config.sync_mode,
            self.config.page_size,
        )
    }

    pub fn home_feed(&self) -> FeedSynchronizer {
        self.feed(FeedScope::Home)
    }

    pub fn favorites_feed(&self) -> FeedSynchronizer {
        self.feed(FeedScope::Favorites)
    }

    pub fn profile_feed(&self, uid: &str) -> FeedSynchronizer {
        self.feed(FeedScope::Profile(uid.to_string()))
    }

    pub fn post_service(&self) -> PostService {
        PostService::new(self.db.clone(), self.blobs.clone(), self.session.clone())
    }

    pub fn favorite_service(&self) -> FavoriteService {
        FavoriteService::new(self.db.clone(), self.session.clone())
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(
            self.db.clone(),
            self.session.clone(),
            self.config.user_search_limit,
        )
    }

    pub fn account_service(&self) -> AccountService {
        AccountService::new(
            self.accounts.clone(),
            self.user_service(),
            self.session.clone(),
        )
    }
}
