//! Common test utilities for integration tests
//!
//! Provides a mock channel authority (OpenID metadata, JWKS and token
//! endpoints) plus RSA/HMAC key material for minting channel tokens.

#![allow(dead_code)]

use std::sync::{Arc, LazyLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use botbuilder_auth::{KeyDirectory, SigningKeyCache, TokenVerifier};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const METADATA_PATH: &str = "/v1/.well-known/openidconfiguration";
pub const JWKS_PATH: &str = "/v1/.well-known/keys";
pub const TOKEN_PATH: &str = "/botframework.com/oauth2/v2.0/token";

pub const CHANNEL_ISSUER: &str = "https://api.botframework.com";
pub const BOT_APP_ID: &str = "bot123";
pub const SERVICE_URL: &str = "https://smba.trafficmanager.net/emea/";

/// Mock channel authority
pub struct MockChannelAuthority {
    pub server: MockServer,
    pub metadata_url: String,
    pub jwks_url: String,
    pub token_endpoint: String,
}

impl MockChannelAuthority {
    /// Start an authority with no endpoints mounted
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();

        Self {
            metadata_url: format!("{base_url}{METADATA_PATH}"),
            jwks_url: format!("{base_url}{JWKS_PATH}"),
            token_endpoint: format!("{base_url}{TOKEN_PATH}"),
            server,
        }
    }

    /// Mount the metadata document pointing at this authority's JWKS
    pub async fn mock_metadata(&self) {
        Mock::given(method("GET"))
            .and(path(METADATA_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issuer": CHANNEL_ISSUER,
                "authorization_endpoint": "https://invalid.botframework.com",
                "jwks_uri": self.jwks_url,
                "id_token_signing_alg_values_supported": ["RS256"],
                "token_endpoint_auth_methods_supported": ["private_key_jwt"],
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount the JWKS endpoint serving `keys`
    pub async fn mock_jwks(&self, keys: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
            .mount(&self.server)
            .await;
    }

    /// Mount the JWKS endpoint serving `keys` for the first `times` calls only
    pub async fn mock_jwks_times(&self, keys: Vec<Value>, times: u64) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }

    /// Mount a token endpoint success response
    pub async fn mock_token_success(&self, access_token: &str, expires_in: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "expires_in": expires_in,
                "ext_expires_in": expires_in,
                "access_token": access_token,
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a token endpoint error response
    pub async fn mock_token_error(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided.",
            })))
            .mount(&self.server)
            .await;
    }

    /// Verifier resolving keys through this authority
    pub fn verifier(&self, ttl: Duration) -> TokenVerifier {
        let client = reqwest::Client::new();
        TokenVerifier::new(
            KeyDirectory::new(client.clone()),
            Arc::new(SigningKeyCache::new(client, ttl)),
            self.metadata_url.clone(),
        )
    }
}

/// RSA signing key with its public JWK
pub struct TestSigningKey {
    pub kid: String,
    pub private_pem: Vec<u8>,
    pub jwk: Value,
}

impl TestSigningKey {
    /// Generate a fresh 2048-bit RSA key
    pub fn generate(kid: &str) -> Self {
        use rsa::RsaPrivateKey;
        use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
        use rsa::traits::PublicKeyParts;

        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate RSA key");

        let private_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("Failed to encode private key")
            .as_bytes()
            .to_vec();

        let jwk = json!({
            "kty": "RSA",
            "use": "sig",
            "kid": kid,
            "n": URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be()),
            "e": URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be()),
            "endorsements": ["msteams", "webchat"],
        });

        Self {
            kid: kid.to_string(),
            private_pem,
            jwk,
        }
    }

    /// Sign `claims` with `algorithm` (RS256/RS384/RS512)
    pub fn sign(&self, algorithm: Algorithm, claims: &Value) -> String {
        let key = EncodingKey::from_rsa_pem(&self.private_pem).expect("Invalid RSA key");
        let mut header = Header::new(algorithm);
        header.kid = Some(self.kid.clone());
        encode(&header, claims, &key).expect("Failed to encode test JWT")
    }

    /// Sign `claims` with RS256 and return an `Authorization` header value
    pub fn bearer(&self, claims: &Value) -> String {
        format!("Bearer {}", self.sign(Algorithm::RS256, claims))
    }
}

/// Key published by the mock authority; generated once per test binary
pub static PRIMARY_KEY: LazyLock<TestSigningKey> =
    LazyLock::new(|| TestSigningKey::generate("primary-2026"));

/// Key that appears after a rotation
pub static ROTATED_KEY: LazyLock<TestSigningKey> =
    LazyLock::new(|| TestSigningKey::generate("rotated-2026"));

/// Shared secret published as an `oct` JWK
pub struct TestHmacKey {
    pub kid: String,
    pub secret: Vec<u8>,
}

impl TestHmacKey {
    pub fn new(kid: &str) -> Self {
        Self {
            kid: kid.to_string(),
            secret: b"0123456789abcdef0123456789abcdef".to_vec(),
        }
    }

    pub fn jwk(&self) -> Value {
        json!({
            "kty": "oct",
            "kid": self.kid,
            "k": URL_SAFE_NO_PAD.encode(&self.secret),
        })
    }

    pub fn sign(&self, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(self.kid.clone());
        encode(&header, claims, &EncodingKey::from_secret(&self.secret))
            .expect("Failed to encode test JWT")
    }
}

/// Build a compact JWT from raw header and payload JSON with a dummy signature
pub fn unsigned_token(header: &Value, payload: &Value) -> String {
    format!(
        "{}.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

/// Get current Unix timestamp
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Claims of a channel token addressed to `aud` for `service_url`
pub fn channel_claims(service_url: &str, aud: &str) -> Value {
    let now = current_timestamp();
    json!({
        "serviceurl": service_url,
        "nbf": now - 10,
        "exp": now + 3600,
        "iss": CHANNEL_ISSUER,
        "aud": aud,
    })
}

/// Install a test subscriber so tracing output shows up with `--nocapture`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("botbuilder_auth=debug")
        .with_test_writer()
        .try_init();
}
