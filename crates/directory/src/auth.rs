//! Access tokens for the directory API.
//!
//! Either a pre-issued bearer token, or an app registration exchanged via the
//! OAuth2 client-credentials flow. Exchanged tokens are cached and refreshed
//! five minutes before they expire.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::DirectoryError;

/// How the client authenticates.
#[derive(Clone)]
pub enum Credentials {
    /// Token obtained elsewhere (e.g. `az account get-access-token`).
    Bearer(String),
    /// App registration with a client secret.
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
}

// Manual Debug so secrets never reach logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Credentials::ClientSecret {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// True if the token is expired or will expire within the grace period.
    fn is_expired(&self, grace_period: Duration) -> bool {
        Utc::now() + grace_period >= self.expires_at
    }
}

/// Hands out access tokens, exchanging client credentials when needed.
pub(crate) struct TokenProvider {
    credentials: Credentials,
    token_url: String,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
    grace_period: Duration,
}

impl TokenProvider {
    pub(crate) fn new(credentials: Credentials, login_endpoint: &str, graph_endpoint: &str) -> Self {
        let token_url = match &credentials {
            Credentials::ClientSecret { tenant_id, .. } => format!(
                "{}/{}/oauth2/v2.0/token",
                login_endpoint.trim_end_matches('/'),
                tenant_id
            ),
            Credentials::Bearer(_) => String::new(),
        };

        Self {
            credentials,
            token_url,
            scope: format!("{}/.default", graph_endpoint.trim_end_matches('/')),
            cached: Mutex::new(None),
            grace_period: Duration::minutes(5),
        }
    }

    /// Get a valid access token, exchanging credentials if necessary.
    pub(crate) fn token(&self, http: &reqwest::blocking::Client) -> Result<String, DirectoryError> {
        let (client_id, client_secret) = match &self.credentials {
            Credentials::Bearer(token) => return Ok(token.clone()),
            Credentials::ClientSecret {
                client_id,
                client_secret,
                ..
            } => (client_id, client_secret),
        };

        let mut cache = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = cache.as_ref() {
            if !token.is_expired(self.grace_period) {
                return Ok(token.access_token.clone());
            }
        }

        debug!("requesting access token from {}", self.token_url);
        let fresh = self.acquire(http, client_id, client_secret)?;
        let access_token = fresh.access_token.clone();
        *cache = Some(fresh);
        Ok(access_token)
    }

    /// Drop the cached token so the next request exchanges again.
    pub(crate) fn invalidate(&self) {
        let mut cache = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        *cache = None;
    }

    fn acquire(
        &self,
        http: &reqwest::blocking::Client,
        client_id: &str,
        client_secret: &str,
    ) -> Result<CachedToken, DirectoryError> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("scope", self.scope.as_str()),
        ];

        let resp = http
            .post(&self.token_url)
            .form(&params)
            .send()
            .map_err(|e| DirectoryError::Network(format!("token request failed: {}", e)))?;

        let status = resp.status();
        let body = resp.text().unwrap_or_default();

        if !status.is_success() {
            let detail = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) if !err.error_description.is_empty() => {
                    format!("{}: {}", err.error, err.error_description)
                }
                Ok(err) if !err.error.is_empty() => err.error,
                _ => body.chars().take(200).collect(),
            };
            return Err(DirectoryError::Auth(format!(
                "token request rejected ({}): {}",
                status.as_u16(),
                detail
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| DirectoryError::Auth(format!("failed to parse token response: {}", e)))?;

        let expires_at = Utc::now() + Duration::seconds(token.expires_in);
        debug!(
            "acquired access token, expires at {}",
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at,
        })
    }
}
