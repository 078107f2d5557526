//! Authentication configuration
//!
//! [`AuthConfig`] mirrors the adapter settings a bot is deployed with: its
//! own credentials, the channel authority endpoints, and the cache and
//! timeout knobs of the authentication core.

use std::path::Path;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_CHANNEL_AUTH_TENANT, TO_BOT_FROM_CHANNEL_OPENID_METADATA_URL, token_endpoint_for_tenant,
};
use crate::credentials::SimpleCredentialProvider;
use crate::error::{AuthError, AuthResult};
use crate::jwt::MAX_KEY_SET_TTL;

/// Environment prefix used by [`AuthConfig::from_env`] and [`AuthConfig::from_file`]
pub const ENV_PREFIX: &str = "BOTBUILDER";

/// Signing keys are refetched after five days
pub const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 5 * 24 * 60 * 60;

/// Upper bound for each metadata, JWKS and token call
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;

/// Clock skew tolerated on `exp`/`nbf`
pub const DEFAULT_CLOCK_SKEW_SECS: u64 = 300;

/// Largest accepted clock skew in seconds
pub const MAX_CLOCK_SKEW_SECS: u64 = 60 * 60;

/// Bot authentication configuration
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Microsoft App id of the bot (empty disables inbound authentication)
    pub app_id: String,
    /// Microsoft App password of the bot
    #[serde(deserialize_with = "deserialize_secret")]
    pub app_password: SecretString,
    /// Tenant used to build the token endpoint
    pub channel_auth_tenant: String,
    /// Explicit token endpoint, overriding the tenant-derived one
    pub oauth_endpoint: Option<String>,
    /// OpenID metadata document of the channel authority
    pub openid_metadata_url: String,
    /// Channel service hint passed through to the authenticator
    pub channel_service: String,
    /// How long a fetched signing key set stays fresh, in seconds
    pub jwks_cache_ttl_secs: u64,
    /// Timeout for each outbound authentication call, in seconds
    pub fetch_timeout_secs: u64,
    /// Clock skew tolerated when checking `exp` and `nbf`, in seconds
    pub clock_skew_secs: u64,
}

// Manual Debug impl to keep the app password out of logs
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("app_id", &self.app_id)
            .field("app_password", &"[REDACTED]")
            .field("channel_auth_tenant", &self.channel_auth_tenant)
            .field("oauth_endpoint", &self.oauth_endpoint)
            .field("openid_metadata_url", &self.openid_metadata_url)
            .field("channel_service", &self.channel_service)
            .field("jwks_cache_ttl_secs", &self.jwks_cache_ttl_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("clock_skew_secs", &self.clock_skew_secs)
            .finish()
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(SecretString::new(s))
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_password: SecretString::new(String::new()),
            channel_auth_tenant: DEFAULT_CHANNEL_AUTH_TENANT.to_string(),
            oauth_endpoint: None,
            openid_metadata_url: TO_BOT_FROM_CHANNEL_OPENID_METADATA_URL.to_string(),
            channel_service: String::new(),
            jwks_cache_ttl_secs: DEFAULT_JWKS_CACHE_TTL_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            clock_skew_secs: DEFAULT_CLOCK_SKEW_SECS,
        }
    }
}

impl AuthConfig {
    /// Configuration for a bot with the given credentials and default endpoints
    pub fn new(app_id: impl Into<String>, app_password: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_password: SecretString::new(app_password.into()),
            ..Self::default()
        }
    }

    /// Load configuration from a file (TOML, YAML, or JSON)
    ///
    /// Environment variables prefixed with `BOTBUILDER_` override file
    /// settings, e.g. `BOTBUILDER_APP_ID=...`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the file is missing, has an
    /// unsupported extension, or does not describe a valid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> AuthResult<Self> {
        use config::{Config, Environment, File};

        let path = path.as_ref();
        if !path.exists() {
            return Err(AuthError::Configuration(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }

        let config: Self = Config::builder()
            .add_source(File::from(path).required(true))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `BOTBUILDER_*` environment variables only
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if a variable has the wrong type
    /// or the resulting configuration is invalid.
    pub fn from_env() -> AuthResult<Self> {
        use config::{Config, Environment};

        let config: Self = Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Set the token tenant
    pub fn with_channel_auth_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.channel_auth_tenant = tenant.into();
        self
    }

    /// Override the token endpoint
    pub fn with_oauth_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.oauth_endpoint = Some(endpoint.into());
        self
    }

    /// Override the OpenID metadata URL
    pub fn with_openid_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.openid_metadata_url = url.into();
        self
    }

    /// Set the channel service hint
    pub fn with_channel_service(mut self, channel_service: impl Into<String>) -> Self {
        self.channel_service = channel_service.into();
        self
    }

    /// Set the signing key cache TTL
    pub fn with_jwks_cache_ttl(mut self, ttl: Duration) -> Self {
        self.jwks_cache_ttl_secs = ttl.as_secs();
        self
    }

    /// Set the per-call timeout
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_secs = timeout.as_secs();
        self
    }

    /// Set the tolerated clock skew
    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew_secs = skew.as_secs();
        self
    }

    /// Check URLs and limits
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] describing the first invalid field.
    pub fn validate(&self) -> AuthResult<()> {
        validate_http_url("openid_metadata_url", &self.openid_metadata_url)?;
        validate_http_url("token endpoint", &self.token_endpoint())?;

        if self.oauth_endpoint.is_none() && self.channel_auth_tenant.trim().is_empty() {
            return Err(AuthError::Configuration(
                "channel_auth_tenant must not be empty".to_string(),
            ));
        }

        if self.jwks_cache_ttl() > MAX_KEY_SET_TTL {
            return Err(AuthError::Configuration(format!(
                "jwks_cache_ttl_secs must not exceed {}",
                MAX_KEY_SET_TTL.as_secs()
            )));
        }

        if self.clock_skew_secs > MAX_CLOCK_SKEW_SECS {
            return Err(AuthError::Configuration(format!(
                "clock_skew_secs must not exceed {MAX_CLOCK_SKEW_SECS}"
            )));
        }

        if self.fetch_timeout_secs == 0 {
            return Err(AuthError::Configuration(
                "fetch_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if !self.app_id.is_empty() && self.app_password.expose_secret().is_empty() {
            tracing::warn!(
                app_id = %self.app_id,
                "app password is empty; outbound token acquisition will fail"
            );
        }

        Ok(())
    }

    /// Token endpoint for the client-credentials exchange
    pub fn token_endpoint(&self) -> String {
        match &self.oauth_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => token_endpoint_for_tenant(&self.channel_auth_tenant),
        }
    }

    /// Signing key cache TTL
    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl_secs)
    }

    /// Per-call timeout
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Clock skew leeway
    pub fn clock_skew(&self) -> Duration {
        Duration::from_secs(self.clock_skew_secs)
    }

    /// Credential provider for the configured app id and password
    pub fn credentials(&self) -> SimpleCredentialProvider {
        SimpleCredentialProvider::new(
            self.app_id.clone(),
            self.app_password.expose_secret().clone(),
        )
    }

    /// HTTP client shared by the key directory, key cache and token cache
    ///
    /// Redirects are not followed and every request is bounded by
    /// [`fetch_timeout`](Self::fetch_timeout).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the TLS backend cannot be
    /// initialised.
    pub fn http_client(&self) -> AuthResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.fetch_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("botbuilder-auth/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuthError::Configuration(format!("failed to build HTTP client: {e}")))
    }
}

fn validate_http_url(field: &str, value: &str) -> AuthResult<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| AuthError::Configuration(format!("{field} is not a valid URL: {e}")))?;

    match parsed.scheme() {
        "https" | "http" => Ok(()),
        other => Err(AuthError::Configuration(format!(
            "{field} must use http or https, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.jwks_cache_ttl(), Duration::from_secs(432_000));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(20));
        assert_eq!(
            config.token_endpoint(),
            "https://login.microsoftonline.com/botframework.com/oauth2/v2.0/token"
        );
        assert_eq!(
            config.openid_metadata_url,
            "https://login.botframework.com/v1/.well-known/openidconfiguration"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_oauth_endpoint_overrides_tenant() {
        let config = AuthConfig::new("bot123", "pw")
            .with_channel_auth_tenant("contoso.onmicrosoft.com")
            .with_oauth_endpoint("http://localhost:9000/token");
        assert_eq!(config.token_endpoint(), "http://localhost:9000/token");

        let config = AuthConfig::new("bot123", "pw").with_channel_auth_tenant("contoso.com");
        assert_eq!(
            config.token_endpoint(),
            "https://login.microsoftonline.com/contoso.com/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = AuthConfig::default().with_openid_metadata_url("not a url");
        assert!(matches!(config.validate(), Err(AuthError::Configuration(_))));

        let config = AuthConfig::default().with_oauth_endpoint("ftp://example.com/token");
        assert!(matches!(config.validate(), Err(AuthError::Configuration(_))));

        let config = AuthConfig::default().with_fetch_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(AuthError::Configuration(_))));

        let mut config = AuthConfig::default();
        config.jwks_cache_ttl_secs = u64::MAX;
        assert!(matches!(config.validate(), Err(AuthError::Configuration(_))));

        let config = AuthConfig::default().with_clock_skew(Duration::from_secs(u64::MAX));
        assert!(matches!(config.validate(), Err(AuthError::Configuration(_))));

        let config =
            AuthConfig::default().with_clock_skew(Duration::from_secs(MAX_CLOCK_SKEW_SECS));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = AuthConfig::new("bot123", "hunter2");
        let debug = format!("{config:?}");
        assert!(debug.contains("bot123"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_credentials_from_config() {
        use crate::credentials::CredentialProvider;

        let credentials = AuthConfig::new("bot123", "pw").credentials();
        assert!(credentials.is_valid_app_id("bot123"));
        assert!(AuthConfig::default().credentials().authentication_disabled());
    }

    #[test]
    fn test_from_file_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
app_id = "file-bot"
app_password = "file-secret"
channel_auth_tenant = "contoso.com"
jwks_cache_ttl_secs = 3600
"#
        )
        .unwrap();

        let config = AuthConfig::from_file(file.path()).unwrap();
        assert_eq!(config.app_id, "file-bot");
        assert_eq!(config.app_password.expose_secret(), "file-secret");
        assert_eq!(config.jwks_cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.fetch_timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS);
        assert_eq!(
            config.token_endpoint(),
            "https://login.microsoftonline.com/contoso.com/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_from_file_missing() {
        let result = AuthConfig::from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }
}
