//! Admin configuration.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

/// Admin configuration with hashed secret.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// The argon2 hashed admin secret.
    pub secret_hash: String,
}

impl AdminConfig {
    pub fn new(secret_hash: String) -> Self {
        Self { secret_hash }
    }

    /// Verify a plaintext secret against the stored hash.
    pub fn verify_secret(&self, plaintext: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.secret_hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Whether `secret` is already an argon2 PHC string.
pub fn is_hashed(secret: &str) -> bool {
    secret.starts_with("$argon2")
}

/// Hash a plaintext secret with a fresh random salt.
pub fn hash_secret(plaintext: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_secret() {
        let hash = hash_secret("test-password").unwrap();
        assert!(is_hashed(&hash));

        let admin_config = AdminConfig::new(hash);

        assert!(admin_config.verify_secret("test-password"));
        assert!(!admin_config.verify_secret("wrong-password"));
    }

    #[test]
    fn test_plaintext_hash_never_verifies() {
        let admin_config = AdminConfig::new("not-a-hash".to_owned());
        assert!(!is_hashed(&admin_config.secret_hash));
        assert!(!admin_config.verify_secret("not-a-hash"));
    }
}
