//! Authentication error types
//!
//! Every failure in this crate is terminal for the request that triggered it.
//! Nothing here retries; the caller decides whether to try again.
//!
//! Messages are safe to return to a remote peer: they never carry claim
//! values, token contents or key material.

use thiserror::Error;

/// Result alias used throughout the crate
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Errors raised while authenticating channel requests or acquiring
/// outbound tokens
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The Authorization header is not a three-segment bearer JWT, or one of
    /// its segments does not decode
    #[error("malformed authorization header")]
    MalformedAuthHeader,

    /// The JWT header carries no string `kid`
    #[error("JWT header is missing a string key id")]
    MissingKeyId,

    /// The key id is not present in the current signing key set
    #[error("signing key not found")]
    UnknownSigningKey,

    /// The token asks for an algorithm outside the allow-list
    #[error("signing algorithm {0} is not allowed")]
    DisallowedAlgorithm(String),

    /// Signature or time-claim validation failed
    #[error("token validation failed: {0}")]
    InvalidToken(String),

    /// The request is not authorized (policy or claim mismatch)
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// The OpenID metadata document could not be fetched or decoded
    #[error("failed to fetch OpenID metadata: {0}")]
    MetadataFetch(String),

    /// The OpenID metadata document has no usable `jwks_uri`
    #[error("OpenID metadata document has no jwks_uri")]
    MetadataFieldMissing,

    /// The JWKS document could not be fetched or decoded
    #[error("failed to fetch signing keys: {0}")]
    KeySetFetch(String),

    /// The client-credentials exchange failed
    #[error("failed to acquire access token: {0}")]
    TokenAcquisition(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Whether the error was caused by the caller's request rather than by
    /// an upstream service or local configuration
    ///
    /// Client errors map to `401 Unauthorized` at the webhook boundary.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedAuthHeader
                | Self::MissingKeyId
                | Self::UnknownSigningKey
                | Self::DisallowedAlgorithm(_)
                | Self::InvalidToken(_)
                | Self::Unauthorized(_)
        )
    }
}

impl From<config::ConfigError> for AuthError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(AuthError::MalformedAuthHeader.is_client_error());
        assert!(AuthError::Unauthorized("invalid issuer").is_client_error());
        assert!(AuthError::DisallowedAlgorithm("HS256".into()).is_client_error());
        assert!(!AuthError::MetadataFetch("timeout".into()).is_client_error());
        assert!(!AuthError::TokenAcquisition("HTTP 500".into()).is_client_error());
        assert!(!AuthError::MetadataFieldMissing.is_client_error());
    }

    #[test]
    fn test_messages_do_not_echo_inputs() {
        assert_eq!(
            AuthError::UnknownSigningKey.to_string(),
            "signing key not found"
        );
        assert_eq!(
            AuthError::Unauthorized("service_url claim is invalid").to_string(),
            "unauthorized: service_url claim is invalid"
        );
    }
}
