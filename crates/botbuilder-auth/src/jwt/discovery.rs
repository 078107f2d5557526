//! OpenID Connect metadata resolution
//!
//! The channel authority publishes an OpenID metadata document whose
//! `jwks_uri` names the current signing key set. [`KeyDirectory`] fetches
//! that document and hands back the URL; it keeps no state of its own.

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{AuthError, AuthResult};

/// OpenID metadata document
///
/// Only `jwks_uri` is read; every other field is ignored.
#[derive(Debug, Clone, Deserialize)]
struct OpenIdMetadata {
    #[serde(default)]
    jwks_uri: Option<serde_json::Value>,
}

/// Resolves OpenID metadata documents to JWKS endpoint URLs
#[derive(Debug, Clone)]
pub struct KeyDirectory {
    http_client: reqwest::Client,
}

impl KeyDirectory {
    /// Create a directory using `http_client` for metadata requests
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Fetch `metadata_url` and return its `jwks_uri`
    ///
    /// A single attempt is made. Nothing is cached, so a failed lookup is
    /// simply repeated by the next caller.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MetadataFetch`] if the request fails, the status is not
    ///   2xx, or the body is not a JSON object
    /// - [`AuthError::MetadataFieldMissing`] if `jwks_uri` is absent, not a
    ///   string, or empty
    #[instrument(skip(self), level = "debug")]
    pub async fn resolve_jwks_url(&self, metadata_url: &str) -> AuthResult<String> {
        let response = self
            .http_client
            .get(metadata_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "failed to fetch OpenID metadata document");
                AuthError::MetadataFetch(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "OpenID metadata endpoint returned error status");
            return Err(AuthError::MetadataFetch(format!("HTTP {status}")));
        }

        let metadata: OpenIdMetadata = response.json().await.map_err(|e| {
            warn!(error = %e, "failed to decode OpenID metadata document");
            AuthError::MetadataFetch(format!("invalid metadata document: {e}"))
        })?;

        let jwks_uri = metadata
            .jwks_uri
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .filter(|uri| !uri.trim().is_empty())
            .ok_or(AuthError::MetadataFieldMissing)?;

        debug!(jwks_uri = %jwks_uri, "resolved JWKS endpoint");
        Ok(jwks_uri.to_string())
    }
}
