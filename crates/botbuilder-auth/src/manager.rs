//! Channel authentication manager
//!
//! Wires the inbound and outbound halves together from one [`AuthConfig`]:
//! one HTTP client, one signing key cache and one outbound token slot,
//! shared by every request the bot handles.

use std::sync::Arc;

use tracing::info;

use crate::activity::Activity;
use crate::authenticator::RequestAuthenticator;
use crate::claims::VerifiedClaims;
use crate::config::AuthConfig;
use crate::credentials::CredentialProvider;
use crate::error::AuthResult;
use crate::jwt::{SigningKeyCache, TokenVerifier};
use crate::oauth2::OutboundTokenCache;

/// Authentication state shared by a bot's request handlers
///
/// Cloning is cheap; clones share the same caches.
///
/// ```rust,no_run
/// # use botbuilder_auth::{Activity, AuthConfig, ChannelAuthManager};
/// # tokio_test::block_on(async {
/// let manager = ChannelAuthManager::new(&AuthConfig::new("bot123", "s3cret"))?;
///
/// let activity = Activity::with_service_url("https://smba.trafficmanager.net/emea/");
/// let claims = manager
///     .authenticate_request(&activity, "Bearer eyJhbGciOiJSUzI1NiIs...")
///     .await?;
///
/// let header = manager.authorization_header().await?;
/// # Ok::<(), botbuilder_auth::AuthError>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct ChannelAuthManager {
    credentials: Arc<dyn CredentialProvider>,
    authenticator: RequestAuthenticator,
    token_cache: Arc<OutboundTokenCache>,
    token_endpoint: String,
    channel_service: String,
}

impl ChannelAuthManager {
    /// Build a manager using the configured app id and password
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`](crate::AuthError::Configuration)
    /// if the configuration is invalid or the HTTP client cannot be built.
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        Self::with_credentials(config, Arc::new(config.credentials()))
    }

    /// Build a manager with a custom credential provider
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`](crate::AuthError::Configuration)
    /// if the configuration is invalid or the HTTP client cannot be built.
    pub fn with_credentials(
        config: &AuthConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> AuthResult<Self> {
        config.validate()?;
        let http_client = config.http_client()?;

        let verifier = TokenVerifier::from_config(config, http_client.clone());
        let manager = Self {
            credentials,
            authenticator: RequestAuthenticator::new(verifier),
            token_cache: Arc::new(OutboundTokenCache::new(http_client)),
            token_endpoint: config.token_endpoint(),
            channel_service: config.channel_service.clone(),
        };

        info!(
            app_id = %manager.credentials.app_id(),
            auth_disabled = manager.credentials.authentication_disabled(),
            metadata_url = %config.openid_metadata_url,
            token_endpoint = %manager.token_endpoint,
            "channel authentication configured"
        );

        Ok(manager)
    }

    /// Authenticate an inbound activity with this bot's credentials
    ///
    /// # Errors
    ///
    /// See [`RequestAuthenticator::authenticate`].
    pub async fn authenticate_request(
        &self,
        activity: &Activity,
        auth_header: &str,
    ) -> AuthResult<Option<VerifiedClaims>> {
        self.authenticator
            .authenticate(
                activity,
                auth_header,
                self.credentials.as_ref(),
                &self.channel_service,
            )
            .await
    }

    /// Access token for outbound Connector calls
    ///
    /// # Errors
    ///
    /// See [`OutboundTokenCache::get_token`].
    pub async fn outbound_token(&self) -> AuthResult<String> {
        self.token_cache
            .get_token(self.credentials.as_ref(), &self.token_endpoint)
            .await
    }

    /// `Authorization` header value for outbound Connector calls
    ///
    /// # Errors
    ///
    /// See [`OutboundTokenCache::get_token`].
    pub async fn authorization_header(&self) -> AuthResult<String> {
        self.token_cache
            .authorization_header(self.credentials.as_ref(), &self.token_endpoint)
            .await
    }

    /// Credential provider in use
    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.credentials
    }

    /// Inbound authenticator
    pub fn authenticator(&self) -> &RequestAuthenticator {
        &self.authenticator
    }

    /// Signing key cache behind the authenticator
    pub fn key_cache(&self) -> &Arc<SigningKeyCache> {
        self.authenticator.verifier().key_cache()
    }

    /// Outbound token cache
    pub fn token_cache(&self) -> &Arc<OutboundTokenCache> {
        &self.token_cache
    }

    /// Token endpoint used for the client-credentials exchange
    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;

    #[test]
    fn test_new_from_defaults() {
        let manager = ChannelAuthManager::new(&AuthConfig::new("bot123", "pw")).unwrap();
        assert_eq!(manager.credentials().app_id(), "bot123");
        assert_eq!(
            manager.token_endpoint(),
            "https://login.microsoftonline.com/botframework.com/oauth2/v2.0/token"
        );
        assert!(!manager.key_cache().is_populated());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = AuthConfig::new("bot123", "pw").with_openid_metadata_url("ftp://nope");
        let err = ChannelAuthManager::new(&config).unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_clones_share_caches() {
        let manager = ChannelAuthManager::new(&AuthConfig::new("", "")).unwrap();
        let clone = manager.clone();
        assert!(Arc::ptr_eq(manager.token_cache(), clone.token_cache()));
        assert!(Arc::ptr_eq(manager.key_cache(), clone.key_cache()));

        let result = clone
            .authenticate_request(&Activity::default(), "")
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
