// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for backend collaborators and for the UI-facing feed layer.
//!
//! Adapters return [`AppError`]. Synchronizers and services convert those
//! into [`FeedError`] at their boundary, so raw backend failures never reach
//! the UI layer.

use serde::Serialize;

/// Failure reported by a backend collaborator (document store, blob store,
/// identity provider).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, AppError>;

/// User-facing error taxonomy returned by feeds and services.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// Network failure or backend unavailable. Feed state is preserved.
    #[error("Temporarily unavailable: {0}")]
    Transient(String),

    /// The action needs a signed-in user.
    #[error("Sign-in required")]
    AuthRequired,

    /// Blob upload or document create failed while posting.
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Caller input was rejected before any backend call.
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// The synchronizer has been disposed.
    #[error("Feed has been disposed")]
    Disposed,
}

/// Short notice shown to the user for a failed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
        }
    }
}

impl FeedError {
    /// Convert a failed fetch or subscribe into the transient variant,
    /// logging the underlying cause.
    pub fn from_fetch(err: AppError) -> Self {
        match err {
            AppError::Unauthorized => FeedError::AuthRequired,
            AppError::Database(msg) | AppError::Storage(msg) | AppError::Identity(msg) => {
                tracing::warn!(error = %msg, "Backend fetch failed");
                FeedError::Transient(msg)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal error during fetch");
                FeedError::Transient(err.to_string())
            }
            other => FeedError::Transient(other.to_string()),
        }
    }

    /// Convert a failure inside the add-post flow.
    pub fn from_upload(err: AppError) -> Self {
        match err {
            AppError::Unauthorized => FeedError::AuthRequired,
            AppError::BadRequest(msg) => FeedError::Invalid(msg),
            other => {
                tracing::error!(error = %other, "Post upload failed");
                FeedError::UploadFailed(other.to_string())
            }
        }
    }

    /// Whether the caller may simply retry the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FeedError::Transient(_) | FeedError::UploadFailed(_))
    }

    /// The notice the UI should display for this error.
    pub fn notice(&self) -> Notice {
        match self {
            FeedError::Transient(_) => Notice::new("Error", "Could not load posts."),
            FeedError::AuthRequired => Notice::new("Not signed in", "Please log in to continue."),
            FeedError::UploadFailed(msg) => Notice::new("Upload failed", msg.clone()),
            FeedError::Invalid(msg) => Notice::new("Invalid input", msg.clone()),
            FeedError::Disposed => Notice::new("Error", "This feed is no longer active."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_errors_become_transient() {
        let err = FeedError::from_fetch(AppError::Database("unavailable".to_string()));
        assert_eq!(err, FeedError::Transient("unavailable".to_string()));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_unauthorized_maps_to_auth_required() {
        assert_eq!(
            FeedError::from_fetch(AppError::Unauthorized),
            FeedError::AuthRequired
        );
        assert_eq!(
            FeedError::from_upload(AppError::Unauthorized),
            FeedError::AuthRequired
        );
    }

    #[test]
    fn test_upload_errors_keep_message() {
        let err = FeedError::from_upload(AppError::Storage("HTTP 503".to_string()));
        let notice = err.notice();
        assert_eq!(notice.title, "Upload failed");
        assert!(notice.message.contains("HTTP 503"));
    }
}
