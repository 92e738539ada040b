//! Token generation utilities.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};

/// Bytes of entropy in a report tracking code.
pub const TRACKING_CODE_BYTES: usize = 24;

/// Bytes of entropy in a session token.
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Generator for opaque, unguessable identifiers.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a report tracking code.
    ///
    /// 24 random bytes from the OS CSPRNG, URL-safe base64 without padding
    /// (32 characters).
    #[must_use]
    pub fn generate_tracking_code(&self) -> String {
        random_url_safe(TRACKING_CODE_BYTES)
    }

    /// Generate a session token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        random_url_safe(SESSION_TOKEN_BYTES)
    }
}

fn random_url_safe(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tracking_code_shape() {
        let id_gen = IdGenerator::new();
        let code = id_gen.generate_tracking_code();

        assert_eq!(code.len(), 32);
        assert!(
            code.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_tracking_codes_do_not_repeat() {
        let id_gen = IdGenerator::new();
        let codes: HashSet<String> = (0..1000).map(|_| id_gen.generate_tracking_code()).collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_generate_token() {
        let id_gen = IdGenerator::new();
        let token = id_gen.generate_token();

        assert_eq!(token.len(), 43);
        assert_ne!(token, id_gen.generate_token());
    }
}
