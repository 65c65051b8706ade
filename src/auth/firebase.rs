// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication client (Identity Toolkit REST API).
//!
//! Handles email/password sign-in and account creation. The returned ID
//! token authorizes Storage uploads.

use crate::auth::AccountBackend;
use crate::error::AppError;
use crate::models::AuthUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Identity Toolkit client.
#[derive(Clone)]
pub struct FirebaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

/// Response body shared by `signInWithPassword` and `signUp`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl FirebaseAuthClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: IDENTITY_TOOLKIT_URL.to_string(),
            api_key,
        }
    }

    /// Point the client at another endpoint (the Auth emulator).
    ///
    /// The emulator serves the same API under
    /// `http://{host}/identitytoolkit.googleapis.com/v1`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create a client honoring `FIREBASE_AUTH_EMULATOR_HOST`.
    pub fn from_env(api_key: String) -> Self {
        let client = Self::new(api_key);
        match std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(host = %host, "Using Firebase Auth emulator");
                client.with_base_url(format!("http://{}/identitytoolkit.googleapis.com/v1", host))
            }
            Err(_) => client,
        }
    }

    async fn password_call(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AppError> {
        let url = format!(
            "{}/accounts:{}?key={}",
            self.base_url,
            method,
            urlencoding::encode(&self.api_key)
        );

        let response = self
            .http
            .post(&url)
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AppError::Identity(format!("{} request failed: {}", method, e)))?;

        let account: AccountResponse = check_response_json(response).await?;

        Ok(AuthUser {
            uid: account.local_id,
            email: account.email.or_else(|| Some(email.to_string())),
            id_token: Some(account.id_token),
        })
    }
}

/// Check response status and parse the JSON body.
///
/// Credential problems come back as HTTP 400 with a message code such as
/// `INVALID_LOGIN_CREDENTIALS` or `EMAIL_EXISTS`.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let code = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_default();

        return Err(classify_error(status.as_u16(), &code, &body));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Identity(format!("JSON parse error: {}", e)))
}

fn classify_error(status: u16, code: &str, body: &str) -> AppError {
    match (status, code) {
        (400, code)
            if code.starts_with("INVALID_")
                || code.starts_with("EMAIL_")
                || code.starts_with("WEAK_PASSWORD")
                || code == "MISSING_PASSWORD" =>
        {
            AppError::BadRequest(code.to_string())
        }
        (401, _) | (403, _) => AppError::Unauthorized,
        _ => AppError::Identity(format!("HTTP {}: {}", status, body)),
    }
}

#[async_trait]
impl AccountBackend for FirebaseAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AppError> {
        self.password_call("signInWithPassword", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AppError> {
        self.password_call("signUp", email, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_errors_are_bad_requests() {
        let err = classify_error(400, "INVALID_LOGIN_CREDENTIALS", "{}");
        assert!(matches!(err, AppError::BadRequest(code) if code == "INVALID_LOGIN_CREDENTIALS"));

        let err = classify_error(400, "EMAIL_EXISTS", "{}");
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_server_errors_are_identity_errors() {
        let err = classify_error(503, "", "unavailable");
        assert!(matches!(err, AppError::Identity(msg) if msg.contains("503")));
    }

    #[test]
    fn test_account_response_parses() {
        let body = r#"{"localId":"uid-1","email":"a@b.c","idToken":"tok","refreshToken":"r"}"#;
        let account: AccountResponse = serde_json::from_str(body).unwrap();
        assert_eq!(account.local_id, "uid-1");
        assert_eq!(account.id_token, "tok");
    }
}
