//! Outbound OAuth2 support
//!
//! The bot presents an access token on every call into the Connector API.
//! Tokens come from the OAuth2 client-credentials grant and are cached until
//! they expire.

pub mod token_cache;

pub use crate::constants::token_endpoint_for_tenant;
pub use token_cache::{OutboundToken, OutboundTokenCache, TokenResponse};
