//! CSRF token port.

/// Issues and checks tokens scoped to an intent string.
///
/// A token issued for one intent must be rejected for every other intent.
pub trait CsrfTokenManager: Send + Sync {
    /// Token to embed in a form protecting `intent`.
    fn token(&self, intent: &str) -> String;

    /// Check a submitted token against `intent`.
    fn is_token_valid(&self, intent: &str, token: &str) -> bool;
}

/// Intent protecting the deletion of one post.
pub fn delete_intent(id: impl std::fmt::Display) -> String {
    format!("delete{id}")
}
