//! Privacy-preserving hashing of client network addresses.
//!
//! Raw addresses are never persisted. Reports and audit entries store a keyed
//! HMAC-SHA256 digest instead, which is stable for abuse correlation but cannot
//! be reversed without the server secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Keyed one-way hasher for client addresses.
#[derive(Clone)]
pub struct IpHasher {
    secret: Vec<u8>,
}

impl std::fmt::Debug for IpHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpHasher").finish_non_exhaustive()
    }
}

impl IpHasher {
    /// Create a hasher keyed with the given secret.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Hash a client address into 64 lowercase hex characters.
    #[must_use]
    pub fn hash(&self, address: &str) -> String {
        // HMAC accepts keys of any length, including empty ones.
        let mut mac = match HmacSha256::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            Err(_) => return String::new(),
        };
        mac.update(address.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Hash an optional address.
    #[must_use]
    pub fn hash_opt(&self, address: Option<&str>) -> Option<String> {
        address.map(|a| self.hash(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_hex() {
        let hasher = IpHasher::new("secret");
        let a = hasher.hash("203.0.113.7");
        let b = hasher.hash("203.0.113.7");

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!a.contains("203"));
    }

    #[test]
    fn test_hash_depends_on_secret_and_address() {
        let one = IpHasher::new("secret-one");
        let two = IpHasher::new("secret-two");

        assert_ne!(one.hash("203.0.113.7"), two.hash("203.0.113.7"));
        assert_ne!(one.hash("203.0.113.7"), one.hash("203.0.113.8"));
    }

    #[test]
    fn test_hash_opt() {
        let hasher = IpHasher::new("secret");
        assert!(hasher.hash_opt(None).is_none());
        assert!(hasher.hash_opt(Some("::1")).is_some());
    }
}
