//! User profile model for storage and search.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Public profile stored in the `users` collection, keyed by user ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Identity provider user ID (also used as document ID)
    #[serde(default, alias = "_firestore_id", skip_serializing)]
    pub id: String,
    /// Display name shown in search results
    #[validate(length(min = 1, max = 30))]
    pub username: String,
    /// Profile picture URL
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Signed-in account as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Stable user ID
    pub uid: String,
    pub email: Option<String>,
    /// Bearer token for storage uploads (absent for local sessions)
    pub id_token: Option<String>,
}

impl AuthUser {
    /// A session with no remote credentials, used offline and in tests.
    pub fn local(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            id_token: None,
        }
    }
}
