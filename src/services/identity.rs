// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity-provider account management.
//!
//! Account creation and credential updates go through the Identity
//! Toolkit REST API, authorized with a service-account access token
//! minted via the JWT-bearer grant. The token is cached until shortly
//! before expiry. Credential hashing and storage stay on the provider
//! side.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{Mutex, RwLock};

use crate::config::Config;
use crate::error::AppError;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/identitytoolkit";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
// Refresh the cached access token this long before it actually expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct ServiceAccountCredentials {
    client_email: String,
    signing_key: EncodingKey,
}

struct CachedAccessToken {
    access_token: String,
    expires_at: Instant,
}

/// Client for identity-provider account operations.
pub struct IdentityClient {
    http_client: reqwest::Client,
    project_id: String,
    credentials: Option<ServiceAccountCredentials>,
    token_cache: RwLock<Option<CachedAccessToken>>,
    refresh_lock: Mutex<()>,
}

impl IdentityClient {
    /// Create a client from the configured service-account credentials.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())?;

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()?;

        tracing::info!(
            client_email = %config.client_email,
            project = %config.project_id,
            "Initialized identity provider client"
        );

        Ok(Self {
            http_client,
            project_id: config.project_id.clone(),
            credentials: Some(ServiceAccountCredentials {
                client_email: config.client_email.clone(),
                signing_key,
            }),
            token_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All provider operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            http_client: reqwest::Client::new(),
            project_id: "test-project".to_string(),
            credentials: None,
            token_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    fn credentials(&self) -> Result<&ServiceAccountCredentials, AppError> {
        self.credentials.as_ref().ok_or_else(|| {
            AppError::Upstream("Identity provider not configured (offline mode)".to_string())
        })
    }

    /// Create a provider account and return its subject identifier.
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<String, AppError> {
        let body = json!({
            "email": email,
            "password": password,
            "displayName": display_name,
        });

        let response: SignUpResponse = self.post("accounts", &body).await?;

        tracing::info!(uid = %response.local_id, "Created identity provider account");
        Ok(response.local_id)
    }

    /// Update email and/or password of an existing provider account.
    pub async fn update_account(
        &self,
        uid: &str,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), AppError> {
        let mut body = json!({ "localId": uid });
        if let Some(email) = email {
            body["email"] = json!(email);
        }
        if let Some(password) = password {
            body["password"] = json!(password);
        }

        let _: UpdateResponse = self.post("accounts:update", &body).await?;

        tracing::info!(uid = %uid, "Updated identity provider account");
        Ok(())
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, AppError> {
        let access_token = self.access_token().await?;
        let url = format!(
            "{}/projects/{}/{}",
            IDENTITY_TOOLKIT_URL, self.project_id, method
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Identity provider request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid identity provider response: {e}")))
    }

    /// Get a cached access token, minting a fresh one when needed.
    async fn access_token(&self) -> Result<String, AppError> {
        let credentials = self.credentials()?;

        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another request may have refreshed while we waited for the lock.
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
            .as_secs() as usize;

        let assertion_claims = AccessTokenAssertion {
            iss: credentials.client_email.clone(),
            scope: OAUTH_SCOPE.to_string(),
            aud: TOKEN_URL.to_string(),
            iat: now,
            exp: now + 3600,
        };

        let assertion = encode(
            &Header::new(Algorithm::RS256),
            &assertion_claims,
            &credentials.signing_key,
        )
        .map_err(|e| AppError::Upstream(format!("Failed to sign token assertion: {e}")))?;

        let response = self
            .http_client
            .post(TOKEN_URL)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Token endpoint request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid token endpoint response: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in)
            .saturating_sub(TOKEN_EXPIRY_MARGIN);

        *self.token_cache.write().await = Some(CachedAccessToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        tracing::debug!(expires_in = token.expires_in, "Minted provider access token");
        Ok(token.access_token)
    }

    async fn cached_token(&self) -> Option<String> {
        let cache = self.token_cache.read().await;
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.access_token.clone())
    }
}

/// Extract the provider's error message so it can be surfaced verbatim.
async fn provider_error(response: reqwest::Response) -> AppError {
    let status = response.status();

    let message = match response.json::<ProviderErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => format!("Identity provider returned status {status}"),
    };

    AppError::Upstream(message)
}

#[derive(Serialize)]
struct AccessTokenAssertion {
    iss: String,
    scope: String,
    aud: String,
    iat: usize,
    exp: usize,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
}

#[derive(Deserialize)]
struct UpdateResponse {
    #[serde(rename = "localId", default)]
    _local_id: Option<String>,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_client_errors_without_network() {
        let client = IdentityClient::new_mock();

        let err = client
            .create_account("a@b.com", "pw", "A B")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));

        let err = client
            .update_account("uid-1", Some("a@b.com"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
