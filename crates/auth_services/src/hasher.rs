use bcrypt::{DEFAULT_COST, hash, verify};

use campground_services::error::HashingError;
use campground_services::ports::PasswordHasher;

/// Salted bcrypt hashes
#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Hasher using bcrypt's default cost
    pub fn new() -> Self {
        Self { cost: DEFAULT_COST }
    }

    /// Hasher with an explicit work factor (4..=31)
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String, HashingError> {
        hash(password, self.cost).map_err(|e| HashingError(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, HashingError> {
        verify(password, hash).map_err(|e| HashingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = BcryptHasher::with_cost(4);

        let hashed = hasher.hash("secret1").unwrap();
        assert_ne!(hashed, "secret1");
        assert!(hasher.verify("secret1", &hashed).unwrap());
        assert!(!hasher.verify("secret2", &hashed).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = BcryptHasher::with_cost(4);
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn test_invalid_cost_and_hash_are_errors() {
        assert!(BcryptHasher::with_cost(2).hash("secret1").is_err());
        assert!(BcryptHasher::new().verify("secret1", "not-a-hash").is_err());
    }
}
