// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process blob store for offline mode and tests.

use crate::error::{AppError, Result};
use crate::storage::BlobStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later upload fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Paths of every stored object.
    pub fn paths(&self) -> Vec<String> {
        self.blobs
            .lock()
            .map(|blobs| blobs.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload_blob(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Storage("HTTP 503: upload rejected".to_string()));
        }

        self.blobs
            .lock()
            .map_err(|_| AppError::Storage("blob table lock poisoned".to_string()))?
            .insert(path.to_string(), bytes);

        Ok(format!("memory://{}", path))
    }
}
