// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in, registration and sign-out.
//!
//! Successful calls update the shared [`SessionContext`], which every feed
//! and service reads on its next operation.

use crate::auth::{AccountBackend, SessionContext};
use crate::error::{AppError, FeedError};
use crate::models::{AuthUser, UserProfile};
use crate::services::UserService;
use std::sync::Arc;
use validator::Validate;

pub struct AccountService {
    accounts: Arc<dyn AccountBackend>,
    users: UserService,
    session: SessionContext,
}

/// Credential rejections are the caller's to fix; everything else is
/// transient.
fn account_error(err: AppError) -> FeedError {
    match err {
        AppError::BadRequest(code) => FeedError::Invalid(code),
        other => FeedError::from_fetch(other),
    }
}

fn check_credentials(email: &str, password: &str) -> Result<(), FeedError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(FeedError::Invalid(
            "Please enter an email and password.".to_string(),
        ));
    }
    Ok(())
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountBackend>, users: UserService, session: SessionContext) -> Self {
        Self {
            accounts,
            users,
            session,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, FeedError> {
        check_credentials(email, password)?;

        let user = self
            .accounts
            .sign_in(email.trim(), password)
            .await
            .map_err(account_error)?;

        self.session.sign_in(user.clone());
        Ok(user)
    }

    /// Create an account with its public profile, then sign in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<AuthUser, FeedError> {
        check_credentials(email, password)?;
        let username = username.trim();
        let draft = UserProfile {
            id: String::new(),
            username: username.to_string(),
            avatar_url: None,
        };
        draft
            .validate()
            .map_err(|_| FeedError::Invalid("Please choose a username of 1 to 30 characters.".to_string()))?;

        let user = self
            .accounts
            .sign_up(email.trim(), password)
            .await
            .map_err(account_error)?;

        // Sign in first; the profile write runs as the new user.
        self.session.sign_in(user.clone());
        self.users.put_profile(&user.uid, username, None).await?;

        tracing::info!(uid = %user.uid, "Account registered");
        Ok(user)
    }

    pub fn sign_out(&self) {
        self.session.sign_out();
    }
}
