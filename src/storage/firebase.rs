// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Storage client (REST upload API).

use crate::auth::SessionContext;
use crate::error::AppError;
use crate::storage::BlobStore;
use async_trait::async_trait;
use serde::Deserialize;

const STORAGE_URL: &str = "https://firebasestorage.googleapis.com/v0";

/// Uploads objects to one bucket as the signed-in user.
#[derive(Clone)]
pub struct FirebaseStorage {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    session: SessionContext,
}

/// Object metadata returned by an upload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

impl FirebaseStorage {
    pub fn new(bucket: String, session: SessionContext) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: STORAGE_URL.to_string(),
            bucket,
            session,
        }
    }

    /// Point the client at another endpoint (the Storage emulator).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create a client honoring `FIREBASE_STORAGE_EMULATOR_HOST`.
    pub fn from_env(bucket: String, session: SessionContext) -> Self {
        let client = Self::new(bucket, session);
        match std::env::var("FIREBASE_STORAGE_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(host = %host, "Using Firebase Storage emulator");
                client.with_base_url(format!("http://{}/v0", host))
            }
            Err(_) => client,
        }
    }

    fn download_url(&self, metadata: &ObjectMetadata) -> String {
        let mut url = format!(
            "{}/b/{}/o/{}?alt=media",
            self.base_url,
            self.bucket,
            urlencoding::encode(&metadata.name)
        );
        // Several comma-separated tokens may be present; any one works.
        if let Some(token) = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|token| !token.is_empty())
        {
            url.push_str("&token=");
            url.push_str(token);
        }
        url
    }
}

#[async_trait]
impl BlobStore for FirebaseStorage {
    async fn upload_blob(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        let url = format!(
            "{}/b/{}/o?uploadType=media&name={}",
            self.base_url,
            self.bucket,
            urlencoding::encode(path)
        );
        let size = bytes.len();

        let mut request = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = self.session.id_token() {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Firebase {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(AppError::Unauthorized);
            }
            return Err(AppError::Storage(format!("HTTP {}: {}", status, body)));
        }

        let metadata: ObjectMetadata = response
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("JSON parse error: {}", e)))?;

        tracing::info!(path = %metadata.name, size, "Blob uploaded");
        Ok(self.download_url(&metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_url_uses_first_token() {
        let storage = FirebaseStorage::new(
            "demo.firebasestorage.app".to_string(),
            SessionContext::signed_out(),
        );
        let metadata = ObjectMetadata {
            name: "posts/uid-1_42.jpg".to_string(),
            download_tokens: Some("tok-a,tok-b".to_string()),
        };

        assert_eq!(
            storage.download_url(&metadata),
            "https://firebasestorage.googleapis.com/v0/b/demo.firebasestorage.app/o/posts%2Fuid-1_42.jpg?alt=media&token=tok-a"
        );
    }
}
