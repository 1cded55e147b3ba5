//! Bearer-token session management.
//!
//! Tokens are 24 random bytes, base64url-encoded, handed out at
//! registration or login and presented on later connections via the
//! auth event. Lookup scans the whole table with a constant-time
//! comparison so a timing side channel cannot narrow down a token
//! prefix.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use dashmap::DashMap;
use rand::RngCore;
use subtle::ConstantTimeEq;
use thiserror::Error;

use sotto_protocol::UserId;

const TOKEN_BYTES: usize = 24;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid or unknown token")]
    Unauthorized,
}

/// Issues and validates session tokens. Tokens live for the process
/// lifetime; there is no expiry or refresh.
#[derive(Default)]
pub struct SessionService {
    tokens: DashMap<String, UserId>,
}

impl SessionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh token for `user_id` and remember it.
    pub fn issue(&self, user_id: &UserId) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);
        self.tokens.insert(token.clone(), user_id.clone());
        token
    }

    /// Resolve a presented token to its user.
    ///
    /// Scans every stored token with `ct_eq` rather than a map lookup,
    /// so validation time does not depend on how much of the token
    /// matches.
    pub fn authenticate(&self, presented: &str) -> Result<UserId, AuthError> {
        let mut found = None;
        for entry in self.tokens.iter() {
            if entry.key().as_bytes().ct_eq(presented.as_bytes()).into() {
                found = Some(entry.value().clone());
            }
        }
        found.ok_or(AuthError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_authenticates() {
        let sessions = SessionService::new();
        let token = sessions.issue(&"alice".to_string());
        assert_eq!(sessions.authenticate(&token).unwrap(), "alice");
    }

    #[test]
    fn unknown_token_rejected() {
        let sessions = SessionService::new();
        sessions.issue(&"alice".to_string());
        assert!(sessions.authenticate("not-a-token").is_err());
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let sessions = SessionService::new();
        let a = sessions.issue(&"alice".to_string());
        let b = sessions.issue(&"alice".to_string());
        assert_ne!(a, b);
        // Both stay valid; login does not invalidate older sessions.
        assert_eq!(sessions.authenticate(&a).unwrap(), "alice");
        assert_eq!(sessions.authenticate(&b).unwrap(), "alice");
    }

    #[test]
    fn token_is_url_safe_base64() {
        let sessions = SessionService::new();
        let token = sessions.issue(&"alice".to_string());
        let bytes = URL_SAFE_NO_PAD.decode(&token).unwrap();
        assert_eq!(bytes.len(), TOKEN_BYTES);
    }

    #[test]
    fn empty_token_rejected() {
        let sessions = SessionService::new();
        sessions.issue(&"alice".to_string());
        assert!(sessions.authenticate("").is_err());
    }
}
