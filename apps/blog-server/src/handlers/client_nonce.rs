//! Per-client nonce that delete tokens are bound to.
//!
//! The nonce lives in an HttpOnly cookie. A client without one gets a fresh
//! nonce, sent back with the response.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse};
use uuid::Uuid;

use crate::middleware::error::AppError;

/// Cookie carrying the client's CSRF nonce.
pub const CSRF_COOKIE: &str = "blog.csrf";

const MAX_NONCE_LEN: usize = 128;

pub struct ClientNonce {
    value: String,
    fresh: bool,
}

impl ClientNonce {
    /// Nonce from the request cookie, or a new one when it is missing or malformed.
    pub fn from_request(req: &HttpRequest) -> Self {
        let existing = req
            .cookie(CSRF_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty() && value.len() <= MAX_NONCE_LEN);

        match existing {
            Some(value) => Self {
                value,
                fresh: false,
            },
            None => Self {
                value: Uuid::new_v4().simple().to_string(),
                fresh: true,
            },
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Hand a freshly issued nonce to the client.
    pub fn attach(&self, response: &mut HttpResponse) -> Result<(), AppError> {
        if !self.fresh {
            return Ok(());
        }

        let cookie = Cookie::build(CSRF_COOKIE, self.value.as_str())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish();

        response
            .add_cookie(&cookie)
            .map_err(|e| AppError::Internal(format!("Failed to set CSRF cookie: {e}")))
    }
}
