//! Signing key set caching
//!
//! [`SigningKeyCache`] keeps the channel authority's published keys in
//! memory and refreshes them on demand:
//!
//! - **TTL-based**: a fetched set stays fresh for a configurable TTL
//!   (5 days by default; signing keys rotate rarely)
//! - **Copy-and-swap**: a refresh builds a complete new [`SigningKeySet`]
//!   and publishes it atomically, so readers never see a half-built set
//! - **Lenient**: no lock is held across the network call; concurrent
//!   callers that all see a stale set may each refresh
//! - **Stale over empty**: a failed refresh keeps the previous set
//!
//! Lookups never perform I/O. Callers check [`SigningKeyCache::is_stale`]
//! and call [`SigningKeyCache::refresh`] first when needed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use jsonwebtoken::jwk::Jwk;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{AuthError, AuthResult};

/// Longest lifetime granted to a fetched key set
pub const MAX_KEY_SET_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// JWKS document as published; keys are parsed one by one so that a single
/// unsupported key does not discard the whole set
#[derive(Debug, Deserialize)]
struct RawJwkSet {
    keys: Vec<serde_json::Value>,
}

/// Immutable snapshot of the authority's signing keys
#[derive(Debug, Clone)]
pub struct SigningKeySet {
    keys: HashMap<String, Arc<Jwk>>,
    fetched_at: Instant,
    expires_at: Instant,
}

impl SigningKeySet {
    /// Build a key set from JWKs, keeping only keys that carry a `kid`
    ///
    /// `ttl` is capped at [`MAX_KEY_SET_TTL`].
    pub fn new(jwks: impl IntoIterator<Item = Jwk>, fetched_at: Instant, ttl: Duration) -> Self {
        let keys = jwks
            .into_iter()
            .filter_map(|jwk| {
                let kid = jwk.common.key_id.clone()?;
                Some((kid, Arc::new(jwk)))
            })
            .collect();

        Self {
            keys,
            fetched_at,
            expires_at: fetched_at + ttl.min(MAX_KEY_SET_TTL),
        }
    }

    /// Key with the given id
    pub fn get(&self, key_id: &str) -> Option<Arc<Jwk>> {
        self.keys.get(key_id).cloned()
    }

    /// Number of keys in the set
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set holds no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key ids in the set
    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// When the set was fetched
    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    /// When the set stops being fresh
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Whether the set is still fresh at `now`
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Shared cache of the channel authority's signing keys
///
/// # Example
///
/// ```rust,no_run
/// # use std::time::{Duration, Instant};
/// # use botbuilder_auth::jwt::SigningKeyCache;
/// # tokio_test::block_on(async {
/// let cache = SigningKeyCache::new(reqwest::Client::new(), Duration::from_secs(5 * 24 * 3600));
///
/// if cache.is_stale(Instant::now()) {
///     cache.refresh("https://login.botframework.com/v1/.well-known/keys").await?;
/// }
/// let key = cache.lookup("key-id-123")?;
/// # Ok::<(), botbuilder_auth::AuthError>(())
/// # });
/// ```
#[derive(Debug)]
pub struct SigningKeyCache {
    http_client: reqwest::Client,
    ttl: Duration,
    current: ArcSwapOption<SigningKeySet>,
}

impl SigningKeyCache {
    /// Create an empty cache
    pub fn new(http_client: reqwest::Client, ttl: Duration) -> Self {
        Self {
            http_client,
            ttl,
            current: ArcSwapOption::empty(),
        }
    }

    /// Whether the cache must be refreshed before use
    ///
    /// True when nothing has been fetched yet or `now` is at or past the
    /// current set's expiry.
    pub fn is_stale(&self, now: Instant) -> bool {
        match self.current.load().as_ref() {
            Some(set) => !set.is_valid_at(now),
            None => true,
        }
    }

    /// Fetch the JWKS document at `jwks_url` and publish it
    ///
    /// On failure the previously published set, if any, stays in place.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeySetFetch`] if the request fails, the status is
    /// not 2xx, or the body is not a JWKS document.
    #[instrument(skip(self), level = "debug")]
    pub async fn refresh(&self, jwks_url: &str) -> AuthResult<()> {
        info!(jwks_url = %jwks_url, "fetching signing keys");

        let response = self
            .http_client
            .get(jwks_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(jwks_url = %jwks_url, error = %e, "failed to fetch JWKS");
                AuthError::KeySetFetch(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(jwks_url = %jwks_url, status = %status, "JWKS endpoint returned error status");
            return Err(AuthError::KeySetFetch(format!("HTTP {status}")));
        }

        let raw: RawJwkSet = response.json().await.map_err(|e| {
            warn!(jwks_url = %jwks_url, error = %e, "failed to decode JWKS");
            AuthError::KeySetFetch(format!("invalid JWKS document: {e}"))
        })?;

        let jwks = raw.keys.into_iter().filter_map(|value| {
            match serde_json::from_value::<Jwk>(value) {
                Ok(jwk) => Some(jwk),
                Err(e) => {
                    warn!(error = %e, "skipping unsupported key in JWKS");
                    None
                }
            }
        });

        let set = SigningKeySet::new(jwks, Instant::now(), self.ttl);
        info!(
            jwks_url = %jwks_url,
            key_count = set.len(),
            ttl_secs = self.ttl.as_secs(),
            "published signing keys"
        );
        self.publish(set);

        Ok(())
    }

    /// Look up a key by id without any I/O
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownSigningKey`] if the id is not in the
    /// current set or nothing has been fetched yet.
    pub fn lookup(&self, key_id: &str) -> AuthResult<Arc<Jwk>> {
        let guard = self.current.load();
        let Some(set) = guard.as_ref() else {
            debug!("signing key lookup against empty cache");
            return Err(AuthError::UnknownSigningKey);
        };

        set.get(key_id).ok_or_else(|| {
            debug!(key_id = %key_id, "key id not in signing key set");
            AuthError::UnknownSigningKey
        })
    }

    /// Currently published set
    pub fn current(&self) -> Option<Arc<SigningKeySet>> {
        self.current.load_full()
    }

    /// Whether any key set has been published
    pub fn is_populated(&self) -> bool {
        self.current.load().is_some()
    }

    /// Number of keys in the published set (0 when empty)
    pub fn key_count(&self) -> usize {
        self.current.load().as_ref().map_or(0, |set| set.len())
    }

    /// Expiry of the published set
    pub fn expires_at(&self) -> Option<Instant> {
        self.current.load().as_ref().map(|set| set.expires_at())
    }

    /// TTL applied to newly fetched sets
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop the published set
    pub fn clear(&self) {
        self.current.store(None);
        debug!("signing key cache cleared");
    }

    pub(crate) fn publish(&self, set: SigningKeySet) {
        self.current.store(Some(Arc::new(set)));
    }
}
