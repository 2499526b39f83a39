//! CSRF token implementations.

mod hmac_token;

pub use hmac_token::HmacCsrfTokenManager;
