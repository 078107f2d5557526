//! Bearer JWT verification
//!
//! [`TokenVerifier`] turns an `Authorization` header value into
//! [`VerifiedClaims`]. Each step is a hard gate; the first failure ends
//! verification:
//!
//! 1. Format: the header must hold a three-segment JWT, optionally prefixed
//!    with `Bearer `
//! 2. Structure: header and payload must decode to JSON objects and the
//!    header must carry a string `kid`
//! 3. Key resolution: the key set is refreshed when stale, then `kid` is
//!    looked up
//! 4. Signature: checked with the header's algorithm against the resolved
//!    key; `exp`/`nbf` are checked when present
//! 5. Algorithm allow-list: only RS256, RS384 and RS512 are accepted, even
//!    when the signature is valid
//!
//! No step retries. Key fetch failures fail closed.

use std::str::FromStr;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use super::{KeyDirectory, SigningKeyCache};
use crate::claims::VerifiedClaims;
use crate::config::{AuthConfig, DEFAULT_CLOCK_SKEW_SECS};
use crate::constants::{ALLOWED_SIGNING_ALGORITHMS, KEY_ID_HEADER};
use crate::error::{AuthError, AuthResult};

static BEARER_TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Bearer )?([A-Za-z0-9_=-]+\.[A-Za-z0-9_=-]+\.[A-Za-z0-9_+/=-]*)$")
        .expect("bearer token pattern is valid")
});

/// Extract the compact JWT from an `Authorization` header value
///
/// Surrounding whitespace is ignored and the `Bearer ` prefix is optional.
/// Returns `None` when the value is not a three-segment JWT.
///
/// ```rust
/// use botbuilder_auth::jwt::extract_bearer_token;
///
/// assert_eq!(extract_bearer_token("Bearer aaa.bbb.ccc"), Some("aaa.bbb.ccc"));
/// assert_eq!(extract_bearer_token("  aaa.bbb.  "), Some("aaa.bbb."));
/// assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
/// ```
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    BEARER_TOKEN_PATTERN
        .captures(header_value.trim())
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str())
}

/// Decode one base64url JWT segment into a JSON object
///
/// Both padded and unpadded encodings are accepted.
pub(crate) fn decode_segment(segment: &str) -> AuthResult<Map<String, Value>> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .or_else(|_| URL_SAFE.decode(segment))
        .map_err(|_| AuthError::MalformedAuthHeader)?;

    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(AuthError::MalformedAuthHeader),
    }
}

/// Decoded, not yet verified, header and payload of a compact JWT
#[derive(Debug)]
pub(crate) struct UnverifiedToken {
    pub(crate) header: Map<String, Value>,
    pub(crate) payload: Map<String, Value>,
}

impl UnverifiedToken {
    pub(crate) fn parse(token: &str) -> AuthResult<Self> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::MalformedAuthHeader);
        };

        Ok(Self {
            header: decode_segment(header)?,
            payload: decode_segment(payload)?,
        })
    }

    fn key_id(&self) -> AuthResult<&str> {
        self.header
            .get(KEY_ID_HEADER)
            .and_then(Value::as_str)
            .ok_or(AuthError::MissingKeyId)
    }

    fn algorithm(&self) -> AuthResult<Algorithm> {
        let name = self
            .header
            .get("alg")
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::DisallowedAlgorithm("missing".to_string()))?;

        Algorithm::from_str(name).map_err(|_| AuthError::DisallowedAlgorithm("unsupported".to_string()))
    }
}

/// Verifies bearer JWTs issued by the channel authority
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use std::time::Duration;
/// # use botbuilder_auth::jwt::{KeyDirectory, SigningKeyCache, TokenVerifier};
/// # use botbuilder_auth::constants::TO_BOT_FROM_CHANNEL_OPENID_METADATA_URL;
/// # tokio_test::block_on(async {
/// let client = reqwest::Client::new();
/// let keys = Arc::new(SigningKeyCache::new(client.clone(), Duration::from_secs(5 * 24 * 3600)));
/// let verifier = TokenVerifier::new(
///     KeyDirectory::new(client),
///     keys,
///     TO_BOT_FROM_CHANNEL_OPENID_METADATA_URL,
/// );
///
/// let claims = verifier.verify("Bearer eyJhbGciOiJSUzI1NiIs...").await?;
/// println!("issuer: {:?}", claims.claim_value("iss"));
/// # Ok::<(), botbuilder_auth::AuthError>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    directory: KeyDirectory,
    keys: Arc<SigningKeyCache>,
    metadata_url: String,
    leeway: Duration,
}

impl TokenVerifier {
    /// Create a verifier resolving keys through `metadata_url`
    pub fn new(
        directory: KeyDirectory,
        keys: Arc<SigningKeyCache>,
        metadata_url: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            keys,
            metadata_url: metadata_url.into(),
            leeway: Duration::from_secs(DEFAULT_CLOCK_SKEW_SECS),
        }
    }

    /// Create a verifier from configuration, sharing `http_client`
    pub fn from_config(config: &AuthConfig, http_client: reqwest::Client) -> Self {
        let keys = Arc::new(SigningKeyCache::new(
            http_client.clone(),
            config.jwks_cache_ttl(),
        ));
        Self::new(
            KeyDirectory::new(http_client),
            keys,
            config.openid_metadata_url.clone(),
        )
        .with_leeway(config.clock_skew())
    }

    /// Set the tolerance applied to `exp` and `nbf`
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Shared signing key cache
    pub fn key_cache(&self) -> &Arc<SigningKeyCache> {
        &self.keys
    }

    /// OpenID metadata URL keys are resolved through
    pub fn metadata_url(&self) -> &str {
        &self.metadata_url
    }

    /// Verify an `Authorization` header value
    ///
    /// # Errors
    ///
    /// - [`AuthError::MalformedAuthHeader`] if the value is not a bearer JWT
    ///   or its segments do not decode
    /// - [`AuthError::MissingKeyId`] if the header has no string `kid`
    /// - [`AuthError::UnknownSigningKey`] if `kid` is not published
    /// - [`AuthError::DisallowedAlgorithm`] if the algorithm cannot be used
    ///   with the key or is outside the allow-list
    /// - [`AuthError::InvalidToken`] if the signature or time claims fail
    /// - [`AuthError::MetadataFetch`], [`AuthError::MetadataFieldMissing`]
    ///   or [`AuthError::KeySetFetch`] if keys cannot be obtained
    #[instrument(skip_all, level = "debug")]
    pub async fn verify(&self, header_value: &str) -> AuthResult<VerifiedClaims> {
        let token = extract_bearer_token(header_value).ok_or(AuthError::MalformedAuthHeader)?;

        let unverified = UnverifiedToken::parse(token)?;
        let key_id = unverified.key_id()?;

        self.ensure_fresh_keys().await?;
        let jwk = self.keys.lookup(key_id)?;

        let algorithm = unverified.algorithm()?;
        let claims = self.verify_signature(token, &jwk, algorithm)?;

        if !ALLOWED_SIGNING_ALGORITHMS.contains(&algorithm) {
            warn!(algorithm = ?algorithm, key_id = %key_id, "rejected token signed with disallowed algorithm");
            return Err(AuthError::DisallowedAlgorithm(format!("{algorithm:?}")));
        }

        debug!(key_id = %key_id, algorithm = ?algorithm, "token verified");
        Ok(VerifiedClaims::new(claims, true))
    }

    /// Refresh the key set when stale
    ///
    /// A stale set is kept in use when the refresh fails.
    async fn ensure_fresh_keys(&self) -> AuthResult<()> {
        if !self.keys.is_stale(Instant::now()) {
            return Ok(());
        }

        match self.refresh_keys().await {
            Ok(()) => Ok(()),
            Err(e) if self.keys.is_populated() => {
                warn!(error = %e, "signing key refresh failed, using stale key set");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn refresh_keys(&self) -> AuthResult<()> {
        let jwks_url = self.directory.resolve_jwks_url(&self.metadata_url).await?;
        self.keys.refresh(&jwks_url).await
    }

    fn verify_signature(
        &self,
        token: &str,
        jwk: &Jwk,
        algorithm: Algorithm,
    ) -> AuthResult<Map<String, Value>> {
        let key = DecodingKey::from_jwk(jwk).map_err(|e| {
            warn!(error = %e, "published signing key is unusable");
            AuthError::InvalidToken("unusable signing key".to_string())
        })?;

        let mut validation = Validation::new(algorithm);
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        validation.validate_nbf = true;
        validation.leeway = self.leeway.as_secs();

        decode::<Map<String, Value>>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidAlgorithm => {
                    debug!(algorithm = ?algorithm, "algorithm does not match key family");
                    AuthError::DisallowedAlgorithm(format!("{algorithm:?}"))
                }
                ErrorKind::InvalidSignature => AuthError::InvalidToken("signature mismatch".to_string()),
                ErrorKind::ExpiredSignature => AuthError::InvalidToken("token expired".to_string()),
                ErrorKind::ImmatureSignature => AuthError::InvalidToken("token not yet valid".to_string()),
                _ => {
                    debug!(error = %e, "token rejected by decoder");
                    AuthError::InvalidToken("token rejected".to_string())
                }
            })
    }
}
