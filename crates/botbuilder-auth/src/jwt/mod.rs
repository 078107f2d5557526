//! Inbound JWT infrastructure
//!
//! ```text
//! TokenVerifier ──► SigningKeyCache ──► KeyDirectory
//!   (verify)          (lookup/refresh)    (OpenID metadata → jwks_uri)
//! ```
//!
//! # Modules
//!
//! - `discovery` - OpenID metadata resolution
//! - `jwks` - signing key set fetching and caching
//! - `validator` - bearer JWT verification

pub mod discovery;
pub mod jwks;
pub mod validator;

pub use discovery::KeyDirectory;
pub use jwks::{MAX_KEY_SET_TTL, SigningKeyCache, SigningKeySet};
pub use validator::{TokenVerifier, extract_bearer_token};
