//! HMAC-based CSRF token manager.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use blog_core::ports::CsrfTokenManager;

const DEFAULT_SECRET: &str = "change-me-in-production";

/// Issues stateless tokens bound to an intent and, optionally, a client.
///
/// The token for an intent is the URL-safe base64 of HMAC-SHA256 over the
/// client nonce and the intent, keyed with the SHA-256 of the configured
/// secret. A manager built by [`for_client`](Self::for_client) only accepts
/// tokens issued for the same nonce.
#[derive(Clone)]
pub struct HmacCsrfTokenManager {
    hmac_key: [u8; 32],
    client_nonce: String,
}

impl HmacCsrfTokenManager {
    /// Build a manager from an arbitrary-length secret.
    pub fn new(secret: &str) -> Self {
        Self {
            hmac_key: Sha256::digest(secret.as_bytes()).into(),
            client_nonce: String::new(),
        }
    }

    /// Same secret, with tokens bound to one client's nonce.
    pub fn for_client(&self, nonce: &str) -> Self {
        Self {
            hmac_key: self.hmac_key,
            client_nonce: nonce.to_string(),
        }
    }

    pub fn from_env() -> Self {
        let secret = std::env::var("CSRF_SECRET").unwrap_or_else(|_| DEFAULT_SECRET.to_string());

        // Warn if using default secret in production
        if secret == DEFAULT_SECRET {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default CSRF secret in production! Set CSRF_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default CSRF secret. Set CSRF_SECRET for production use.");
            }
        }

        Self::new(&secret)
    }

    fn hmac(&self, intent: &str) -> Hmac<Sha256> {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(&self.hmac_key)
            .expect("HMAC can take key of any size");
        // Length prefix keeps (nonce, intent) pairs unambiguous.
        mac.update(&(self.client_nonce.len() as u64).to_be_bytes());
        mac.update(self.client_nonce.as_bytes());
        mac.update(intent.as_bytes());
        mac
    }
}

impl CsrfTokenManager for HmacCsrfTokenManager {
    fn token(&self, intent: &str) -> String {
        URL_SAFE_NO_PAD.encode(self.hmac(intent).finalize().into_bytes())
    }

    fn is_token_valid(&self, intent: &str, token: &str) -> bool {
        let Ok(tag) = URL_SAFE_NO_PAD.decode(token.trim()) else {
            return false;
        };
        self.hmac(intent).verify_slice(&tag).is_ok()
    }
}
