//! Emulator token probe
//!
//! The local emulator sends tokens shaped like channel tokens. This probe
//! only looks at their structure; it performs no signature check and must
//! not be used to authorize anything.

use crate::constants::ISSUER_CLAIM;
use crate::jwt::validator::UnverifiedToken;

/// Whether `auth_header` carries a `Bearer` JWT with an `iss` claim
///
/// ```rust
/// use botbuilder_auth::emulator::is_token_from_emulator;
///
/// // {"alg":"RS256"} . {"iss":"https://sts.windows.net/"} . sig
/// let header = "Bearer eyJhbGciOiJSUzI1NiJ9.eyJpc3MiOiJodHRwczovL3N0cy53aW5kb3dzLm5ldC8ifQ.c2ln";
/// assert!(is_token_from_emulator(header));
/// assert!(!is_token_from_emulator(""));
/// ```
pub fn is_token_from_emulator(auth_header: &str) -> bool {
    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return false;
    };
    if token.contains(' ') || token.split('.').count() != 3 {
        return false;
    }

    UnverifiedToken::parse(token).is_ok_and(|parsed| parsed.payload.contains_key(ISSUER_CLAIM))
}
