// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session state and the identity provider ports.
//!
//! [`SessionContext`] is the single source of truth for "who is signed in".
//! It is passed explicitly to every feed and service; an empty session is a
//! normal state, not an error.

pub mod firebase;
pub mod memory;

pub use firebase::FirebaseAuthClient;
pub use memory::MemoryAccounts;

use crate::error::Result;
use crate::models::AuthUser;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// Answers "which user is acting right now".
pub trait IdentityProvider: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// Email/password account backend.
#[async_trait]
pub trait AccountBackend: Send + Sync {
    /// Authenticate an existing account.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Create an account and return it signed in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser>;
}

/// Shared handle to the current session.
///
/// Clones observe the same session; changes are broadcast to every
/// receiver from [`SessionContext::watch`].
#[derive(Clone)]
pub struct SessionContext {
    sender: Arc<watch::Sender<Option<AuthUser>>>,
}

impl SessionContext {
    pub fn signed_out() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn signed_in(user: AuthUser) -> Self {
        let session = Self::signed_out();
        session.sign_in(user);
        session
    }

    pub fn sign_in(&self, user: AuthUser) {
        tracing::info!(uid = %user.uid, "Session started");
        self.sender.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        if let Some(user) = self.sender.send_replace(None) {
            tracing::info!(uid = %user.uid, "Session ended");
        }
    }

    /// The signed-in user, if any.
    pub fn current(&self) -> Option<AuthUser> {
        self.sender.borrow().clone()
    }

    /// Bearer token of the signed-in user, if the session carries one.
    pub fn id_token(&self) -> Option<String> {
        self.sender
            .borrow()
            .as_ref()
            .and_then(|user| user.id_token.clone())
    }

    /// Subscribe to session changes.
    pub fn watch(&self) -> watch::Receiver<Option<AuthUser>> {
        self.sender.subscribe()
    }
}

impl IdentityProvider for SessionContext {
    fn current_user_id(&self) -> Option<String> {
        self.sender.borrow().as_ref().map(|user| user.uid.clone())
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("uid", &self.current_user_id())
            .finish()
    }
}
