// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process account backend for offline mode and tests.

use crate::auth::AccountBackend;
use crate::error::{AppError, Result};
use crate::models::AuthUser;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MemoryAccounts {
    /// email -> (uid, password)
    accounts: Arc<Mutex<HashMap<String, (String, String)>>>,
}

impl MemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountBackend for MemoryAccounts {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let accounts = self
            .accounts
            .lock()
            .map_err(|_| AppError::Identity("account table lock poisoned".to_string()))?;

        match accounts.get(email) {
            Some((uid, stored)) if stored == password => Ok(AuthUser {
                uid: uid.clone(),
                email: Some(email.to_string()),
                id_token: None,
            }),
            _ => Err(AppError::BadRequest("INVALID_LOGIN_CREDENTIALS".to_string())),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let mut accounts = self
            .accounts
            .lock()
            .map_err(|_| AppError::Identity("account table lock poisoned".to_string()))?;

        if accounts.contains_key(email) {
            return Err(AppError::BadRequest("EMAIL_EXISTS".to_string()));
        }

        let uid = format!("uid-{:04}", accounts.len() + 1);
        accounts.insert(email.to_string(), (uid.clone(), password.to_string()));
        Ok(AuthUser {
            uid,
            email: Some(email.to_string()),
            id_token: None,
        })
    }
}
