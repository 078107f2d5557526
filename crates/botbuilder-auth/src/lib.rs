//! # botbuilder-auth - Bot Framework Channel Authentication
//!
//! Bidirectional authentication between a bot and the Bot Framework channel
//! service.
//!
//! ## Trust Directions
//!
//! - **Inbound**: the channel calls the bot's webhook with a bearer JWT.
//!   The token is verified against the channel authority's published key
//!   set (JWKS), then checked for issuer, audience and service URL.
//! - **Outbound**: the bot calls the Connector API with an access token
//!   obtained through the OAuth2 client-credentials grant and cached until
//!   it expires.
//!
//! ## Architecture
//!
//! - [`jwt`] - OpenID metadata resolution, signing key cache, token verifier
//! - [`authenticator`] - channel policy applied to verified tokens
//! - [`oauth2`] - client-credentials token acquisition and caching
//! - [`manager`] - one-stop wiring of both halves from an [`AuthConfig`]
//! - [`credentials`] - the bot's app id and password
//! - [`config`] - configuration loading (file + environment)
//! - [`emulator`] - structural probe for emulator tokens
//!
//! Both caches publish immutable snapshots through `arc-swap`; lookups never
//! block on a refresh in progress and nothing runs in the background.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use botbuilder_auth::{Activity, AuthConfig, ChannelAuthManager};
//!
//! # tokio_test::block_on(async {
//! let config = AuthConfig::from_env()?;
//! let manager = ChannelAuthManager::new(&config)?;
//!
//! // Inbound: authenticate the webhook call
//! let activity: Activity = serde_json::from_str(r#"{"serviceUrl":"https://smba.trafficmanager.net/emea/"}"#)
//!     .expect("valid activity");
//! match manager.authenticate_request(&activity, "Bearer eyJhbGciOi...").await {
//!     Ok(Some(claims)) => println!("from {:?}", claims.claim_value("iss")),
//!     Ok(None) => println!("authentication disabled"),
//!     Err(e) => println!("rejected: {e}"),
//! }
//!
//! // Outbound: header for Connector API calls
//! let header = manager.authorization_header().await?;
//! # Ok::<(), botbuilder_auth::AuthError>(())
//! # });
//! ```
//!
//! ## Standards
//!
//! - **RFC 7519** - JSON Web Token (JWT)
//! - **RFC 7517** - JSON Web Key (JWK)
//! - **RFC 6749 §4.4** - OAuth 2.0 Client Credentials Grant
//! - **OpenID Connect Discovery 1.0** - metadata document

pub mod activity;
pub mod authenticator;
pub mod claims;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod emulator;
pub mod error;
pub mod jwt;
pub mod manager;
pub mod oauth2;

#[doc(inline)]
pub use activity::{Activity, ConversationAccount};

#[doc(inline)]
pub use authenticator::RequestAuthenticator;

#[doc(inline)]
pub use claims::VerifiedClaims;

#[doc(inline)]
pub use config::AuthConfig;

#[doc(inline)]
pub use credentials::{CredentialProvider, SimpleCredentialProvider};

#[doc(inline)]
pub use error::{AuthError, AuthResult};

#[doc(inline)]
pub use jwt::{KeyDirectory, SigningKeyCache, SigningKeySet, TokenVerifier};

#[doc(inline)]
pub use manager::ChannelAuthManager;

#[doc(inline)]
pub use oauth2::{OutboundToken, OutboundTokenCache};
