//! Fixed Bot Framework interop constants
//!
//! These values must match the channel authority byte-for-byte.

use jsonwebtoken::Algorithm;

/// OpenID metadata document for tokens sent by the channel service
pub const TO_BOT_FROM_CHANNEL_OPENID_METADATA_URL: &str =
    "https://login.botframework.com/v1/.well-known/openidconfiguration";

/// Expected `iss` of tokens sent by the channel service
pub const TO_BOT_FROM_CHANNEL_TOKEN_ISSUER: &str = "https://api.botframework.com";

/// OAuth scope requested for bot-to-channel tokens
pub const TO_CHANNEL_FROM_BOT_OAUTH_SCOPE: &str = "https://api.botframework.com/.default";

/// Login URL prefix of the token authority
pub const TO_CHANNEL_FROM_BOT_LOGIN_URL_PREFIX: &str = "https://login.microsoftonline.com/";

/// Token endpoint path under the tenant
pub const TO_CHANNEL_FROM_BOT_TOKEN_ENDPOINT_PATH: &str = "/oauth2/v2.0/token";

/// Default tenant for bot-to-channel tokens
pub const DEFAULT_CHANNEL_AUTH_TENANT: &str = "botframework.com";

/// Signing algorithms accepted on inbound tokens
pub const ALLOWED_SIGNING_ALGORITHMS: [Algorithm; 3] =
    [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

/// Issuer claim (RFC 7519 section 4.1.1)
pub const ISSUER_CLAIM: &str = "iss";

/// Audience claim (RFC 7519 section 4.1.3)
pub const AUDIENCE_CLAIM: &str = "aud";

/// Key id header parameter (RFC 7515 section 4.1.4)
pub const KEY_ID_HEADER: &str = "kid";

/// Service URL claim used by Bot Framework v3.1 auth
pub const SERVICE_URL_CLAIM: &str = "serviceurl";

/// Build the token endpoint for a tenant
///
/// ```rust
/// use botbuilder_auth::constants::token_endpoint_for_tenant;
///
/// assert_eq!(
///     token_endpoint_for_tenant("botframework.com"),
///     "https://login.microsoftonline.com/botframework.com/oauth2/v2.0/token",
/// );
/// ```
pub fn token_endpoint_for_tenant(tenant: &str) -> String {
    format!(
        "{TO_CHANNEL_FROM_BOT_LOGIN_URL_PREFIX}{tenant}{TO_CHANNEL_FROM_BOT_TOKEN_ENDPOINT_PATH}"
    )
}
