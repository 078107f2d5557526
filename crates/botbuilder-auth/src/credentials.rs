//! Bot credentials
//!
//! A [`CredentialProvider`] answers three questions for the authenticator and
//! the outbound token cache: is this app id ours, what is its password, and
//! is authentication switched off entirely.

use secrecy::SecretString;

/// Capability set describing the bot's own identity
///
/// Implementations must be cheap to query; they are consulted on every
/// inbound request.
pub trait CredentialProvider: Send + Sync + std::fmt::Debug {
    /// Whether `app_id` identifies this bot
    fn is_valid_app_id(&self, app_id: &str) -> bool;

    /// Password registered for `app_id`, if this provider knows it
    fn app_password(&self, app_id: &str) -> Option<SecretString>;

    /// The app id this bot presents on outbound calls
    fn app_id(&self) -> &str;

    /// Whether inbound requests may arrive without any credentials
    ///
    /// Only meant for local development against the emulator.
    fn authentication_disabled(&self) -> bool;
}

/// Credential provider holding a single app id and password
#[derive(Clone)]
pub struct SimpleCredentialProvider {
    app_id: String,
    password: SecretString,
}

// Manual Debug impl to keep the password out of logs
impl std::fmt::Debug for SimpleCredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleCredentialProvider")
            .field("app_id", &self.app_id)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl SimpleCredentialProvider {
    /// Create a provider for one app id/password pair
    ///
    /// An empty `app_id` disables authentication.
    ///
    /// ```rust
    /// use botbuilder_auth::{CredentialProvider, SimpleCredentialProvider};
    ///
    /// let credentials = SimpleCredentialProvider::new("bot123", "s3cret");
    /// assert!(credentials.is_valid_app_id("bot123"));
    /// assert!(!credentials.authentication_disabled());
    /// ```
    pub fn new(app_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            password: SecretString::new(password.into()),
        }
    }

    /// Provider with no identity, for local testing
    pub fn disabled() -> Self {
        Self::new("", "")
    }
}

impl CredentialProvider for SimpleCredentialProvider {
    fn is_valid_app_id(&self, app_id: &str) -> bool {
        self.app_id == app_id
    }

    fn app_password(&self, app_id: &str) -> Option<SecretString> {
        if self.is_valid_app_id(app_id) {
            Some(self.password.clone())
        } else {
            None
        }
    }

    fn app_id(&self) -> &str {
        &self.app_id
    }

    fn authentication_disabled(&self) -> bool {
        self.app_id.is_empty()
    }
}
