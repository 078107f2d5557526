//! Inbound request authentication
//!
//! [`RequestAuthenticator`] applies the channel policy on top of
//! [`TokenVerifier`]: the token must be valid, must have been minted for the
//! service URL the activity claims to come from, must be issued by the
//! channel authority and must be addressed to this bot.

use tracing::{debug, instrument, warn};

use crate::activity::Activity;
use crate::claims::VerifiedClaims;
use crate::constants::{
    AUDIENCE_CLAIM, ISSUER_CLAIM, SERVICE_URL_CLAIM, TO_BOT_FROM_CHANNEL_TOKEN_ISSUER,
};
use crate::credentials::CredentialProvider;
use crate::error::{AuthError, AuthResult};
use crate::jwt::{TokenVerifier, extract_bearer_token};

/// Authenticates activities delivered to the bot's webhook
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    verifier: TokenVerifier,
}

impl RequestAuthenticator {
    /// Create an authenticator around `verifier`
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    /// Underlying token verifier
    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Authenticate one inbound activity
    ///
    /// Returns `Ok(None)` when the request carries no bearer token and
    /// `credentials` has authentication disabled. Otherwise the token is
    /// verified and the policy checks run in order: `serviceurl` must equal
    /// the activity's service URL, `iss` must be the channel authority and
    /// `aud` must be one of our app ids.
    ///
    /// `channel_service_hint` is recorded on the tracing span; there is a
    /// single channel authority, so it does not change the checks.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] for every rejection. The cause of
    /// a verification failure is logged, never returned.
    #[instrument(
        skip_all,
        level = "debug",
        fields(activity_id = %activity.id, channel_service = %channel_service_hint)
    )]
    pub async fn authenticate(
        &self,
        activity: &Activity,
        auth_header: &str,
        credentials: &dyn CredentialProvider,
        channel_service_hint: &str,
    ) -> AuthResult<Option<VerifiedClaims>> {
        if extract_bearer_token(auth_header).is_none() {
            if credentials.authentication_disabled() {
                debug!("no bearer token and authentication disabled, skipping verification");
                return Ok(None);
            }
            if auth_header.trim().is_empty() {
                warn!("rejected request without authorization header");
                return Err(AuthError::Unauthorized("missing authorization header"));
            }
        }

        let claims = self.verifier.verify(auth_header).await.map_err(|e| {
            warn!(error = %e, "token verification failed");
            AuthError::Unauthorized("invalid token")
        })?;

        if claims.claim_value(SERVICE_URL_CLAIM) != Some(activity.service_url.as_str()) {
            warn!("token service URL does not match activity");
            return Err(AuthError::Unauthorized("service URL mismatch"));
        }

        if claims.claim_value(ISSUER_CLAIM) != Some(TO_BOT_FROM_CHANNEL_TOKEN_ISSUER) {
            warn!("token issued by an unexpected authority");
            return Err(AuthError::Unauthorized("invalid issuer"));
        }

        let audience_ok = claims
            .claim_value(AUDIENCE_CLAIM)
            .is_some_and(|aud| credentials.is_valid_app_id(aud));
        if !audience_ok {
            warn!("token audience is not this bot");
            return Err(AuthError::Unauthorized("invalid audience"));
        }

        debug!("request authenticated");
        Ok(Some(claims))
    }
}
