//! Client-credentials token acquisition with a single-slot cache
//!
//! The bot authenticates to the Connector API with an access token obtained
//! from the token authority through the OAuth2 client-credentials grant.
//! [`OutboundTokenCache`] keeps the latest token until it expires and only
//! talks to the authority when the slot is empty or stale.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info, instrument, warn};

use crate::constants::TO_CHANNEL_FROM_BOT_OAUTH_SCOPE;
use crate::credentials::CredentialProvider;
use crate::error::{AuthError, AuthResult};

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Token type, `Bearer` in practice
    #[serde(default)]
    pub token_type: String,
    /// Lifetime in seconds
    #[serde(deserialize_with = "seconds_from_number_or_string")]
    pub expires_in: u64,
    /// Extended lifetime in seconds, reported by some authorities
    #[serde(default, deserialize_with = "optional_seconds_from_number_or_string")]
    pub ext_expires_in: Option<u64>,
    /// The access token
    pub access_token: SecretString,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Seconds {
    Number(u64),
    Text(String),
}

impl Seconds {
    fn into_secs<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            Self::Number(secs) => Ok(secs),
            Self::Text(text) => text.trim().parse().map_err(E::custom),
        }
    }
}

// Some authorities send lifetimes as JSON strings
fn seconds_from_number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Seconds::deserialize(deserializer)?.into_secs()
}

fn optional_seconds_from_number_or_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    Option::<Seconds>::deserialize(deserializer)?
        .map(Seconds::into_secs)
        .transpose()
}

/// Cached access token
#[derive(Debug, Clone)]
pub struct OutboundToken {
    access_token: SecretString,
    expires_at: Instant,
}

impl OutboundToken {
    /// The raw access token
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// When the token stops being usable
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Whether the token can still be used at `now`
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Single-slot cache of the bot's outbound access token
///
/// # Example
///
/// ```rust,no_run
/// # use botbuilder_auth::{OutboundTokenCache, SimpleCredentialProvider};
/// # use botbuilder_auth::constants::{token_endpoint_for_tenant, DEFAULT_CHANNEL_AUTH_TENANT};
/// # tokio_test::block_on(async {
/// let cache = OutboundTokenCache::new(reqwest::Client::new());
/// let credentials = SimpleCredentialProvider::new("bot123", "s3cret");
/// let endpoint = token_endpoint_for_tenant(DEFAULT_CHANNEL_AUTH_TENANT);
///
/// let header = cache.authorization_header(&credentials, &endpoint).await?;
/// assert!(header.starts_with("Bearer "));
/// # Ok::<(), botbuilder_auth::AuthError>(())
/// # });
/// ```
#[derive(Debug)]
pub struct OutboundTokenCache {
    http_client: reqwest::Client,
    current: ArcSwapOption<OutboundToken>,
}

impl OutboundTokenCache {
    /// Create an empty cache
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            current: ArcSwapOption::empty(),
        }
    }

    /// Return a valid access token, acquiring a new one when needed
    ///
    /// A cached token that has not expired is returned without any I/O.
    /// Otherwise the client-credentials exchange runs against
    /// `token_endpoint` and the result replaces the cached token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenAcquisition`] if the provider has no
    /// password, the request fails, the status is not 2xx or the response
    /// does not decode. The cached token is left untouched.
    #[instrument(skip(self, credentials), level = "debug")]
    pub async fn get_token(
        &self,
        credentials: &dyn CredentialProvider,
        token_endpoint: &str,
    ) -> AuthResult<String> {
        if let Some(token) = self.cached_token() {
            debug!("using cached access token");
            return Ok(token);
        }

        let token = self.acquire(credentials, token_endpoint).await?;
        let access_token = token.access_token().to_string();
        self.current.store(Some(Arc::new(token)));
        Ok(access_token)
    }

    /// `Authorization` header value for outbound Connector calls
    ///
    /// # Errors
    ///
    /// Same as [`get_token`](Self::get_token).
    pub async fn authorization_header(
        &self,
        credentials: &dyn CredentialProvider,
        token_endpoint: &str,
    ) -> AuthResult<String> {
        let token = self.get_token(credentials, token_endpoint).await?;
        Ok(format!("Bearer {token}"))
    }

    /// Cached token if it is still valid
    pub fn cached_token(&self) -> Option<String> {
        self.current
            .load()
            .as_ref()
            .filter(|token| token.is_valid_at(Instant::now()))
            .map(|token| token.access_token().to_string())
    }

    /// Current cache entry, valid or not
    pub fn current(&self) -> Option<Arc<OutboundToken>> {
        self.current.load_full()
    }

    /// Drop the cached token so the next call acquires a fresh one
    pub fn invalidate(&self) {
        self.current.store(None);
        debug!("outbound token invalidated");
    }

    async fn acquire(
        &self,
        credentials: &dyn CredentialProvider,
        token_endpoint: &str,
    ) -> AuthResult<OutboundToken> {
        let app_id = credentials.app_id();
        let password = credentials
            .app_password(app_id)
            .filter(|secret| !secret.expose_secret().is_empty())
            .ok_or_else(|| {
                warn!(app_id = %app_id, "no app password available for token acquisition");
                AuthError::TokenAcquisition("no app password configured".to_string())
            })?;

        info!(app_id = %app_id, "acquiring outbound access token");
        let requested_at = Instant::now();

        let form_data = [
            ("grant_type", "client_credentials"),
            ("client_id", app_id),
            ("client_secret", password.expose_secret().as_str()),
            ("scope", TO_CHANNEL_FROM_BOT_OAUTH_SCOPE),
        ];

        let response = self
            .http_client
            .post(token_endpoint)
            .form(&form_data)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "token request failed");
                AuthError::TokenAcquisition(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "token endpoint returned error status");
            return Err(AuthError::TokenAcquisition(format!("HTTP {status}")));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "failed to decode token response");
            AuthError::TokenAcquisition(format!("invalid token response: {e}"))
        })?;

        if body.access_token.expose_secret().is_empty() {
            return Err(AuthError::TokenAcquisition("empty access token".to_string()));
        }

        info!(
            app_id = %app_id,
            token_type = %body.token_type,
            expires_in = body.expires_in,
            "acquired outbound access token"
        );

        let expires_at = requested_at
            .checked_add(Duration::from_secs(body.expires_in))
            .ok_or_else(|| {
                warn!(expires_in = body.expires_in, "token lifetime out of range");
                AuthError::TokenAcquisition("token lifetime out of range".to_string())
            })?;

        Ok(OutboundToken {
            access_token: body.access_token,
            expires_at,
        })
    }
}
