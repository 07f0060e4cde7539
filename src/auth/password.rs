use crate::auth::AuthError;
use tracing::warn;

/// One-way password hashing over bcrypt. Hashing only fails when the OS
/// entropy source does; verification never fails on mismatch.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher {
    /// Lower costs are for tests only.
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        bcrypt::hash(password, self.cost).map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Verify a password against a stored hash. A malformed stored hash is
    /// logged and treated as a mismatch rather than an error, so callers can
    /// compare against an empty hash without panicking. bcrypt compares
    /// against the stored digest in constant time.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        match bcrypt::verify(password, stored_hash) {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "stored password hash could not be parsed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        // MIN_COST keeps the test suite fast.
        PasswordHasher::with_cost(4)
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hasher = hasher();
        let hash = hasher.hash("hunter22").unwrap();
        assert_ne!(hash, "hunter22");
        assert!(hasher.verify("hunter22", &hash));
    }

    #[test]
    fn test_wrong_password_is_mismatch() {
        let hasher = hasher();
        let hash = hasher.hash("correct horse").unwrap();
        assert!(!hasher.verify("battery staple", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = hasher();
        let a = hasher.hash("same").unwrap();
        let b = hasher.hash("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_stored_hash_fails_deterministically() {
        let hasher = hasher();
        assert!(!hasher.verify("anything", ""));
    }

    #[test]
    fn test_malformed_stored_hash_is_false_not_error() {
        let hasher = hasher();
        assert!(!hasher.verify("anything", "not-a-bcrypt-hash"));
    }
}
