//! Verified claim set

use serde_json::{Map, Value};

/// Claims of a token whose signature and algorithm have been verified
///
/// Values can only be read. A `VerifiedClaims` is produced by
/// [`TokenVerifier`](crate::jwt::TokenVerifier) and never altered afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedClaims {
    claims: Map<String, Value>,
    authenticated: bool,
}

impl VerifiedClaims {
    pub(crate) fn new(claims: Map<String, Value>, authenticated: bool) -> Self {
        Self {
            claims,
            authenticated,
        }
    }

    /// String value of a claim
    ///
    /// Returns `None` when the claim is absent or is not a JSON string.
    pub fn claim_value(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }

    /// Raw JSON value of a claim
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Whether the claim set came from a verified token
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Claim names present in the token
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.claims.keys().map(String::as_str)
    }
}
