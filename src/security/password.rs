use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use hmac::{Hmac, Mac};
use log::debug;
use rand::rngs::OsRng;
use sha2::Sha256;

/// Password hashing errors
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Invalid Argon2 parameters: {0}")]
    InvalidParameters(String),

    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),

    #[error("Failed to apply pepper: {0}")]
    Pepper(String),
}

/// One-way password hashing used by the account service
#[cfg_attr(test, mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    /// Hash a password into a self-describing PHC string (salt included)
    fn hash_password(&self, password: &str) -> Result<String, PasswordError>;

    /// Check a password against a stored PHC string
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, PasswordError>;
}

/// Argon2id hasher with an optional server-side pepper
pub struct Argon2Hasher {
    memory_kib: u32,
    pepper: Option<Vec<u8>>,
}

impl Argon2Hasher {
    pub fn new(memory_kib: u32, pepper: Option<&str>) -> Self {
        Self {
            memory_kib,
            pepper: pepper.filter(|p| !p.is_empty()).map(|p| p.as_bytes().to_vec()),
        }
    }

    fn argon2(&self) -> Result<Argon2<'static>, PasswordError> {
        let params = Params::new(
            self.memory_kib, // Memory cost (kibibytes)
            2,               // Iterations
            1,               // Parallelism
            None,            // Output length (defaults to 32 bytes)
        )
        .map_err(|e| PasswordError::InvalidParameters(e.to_string()))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// HMAC-SHA256 the password with the pepper, if one is configured
    fn apply_pepper(&self, password: &str) -> Result<Vec<u8>, PasswordError> {
        match &self.pepper {
            None => Ok(password.as_bytes().to_vec()),
            Some(pepper) => {
                let mut mac = Hmac::<Sha256>::new_from_slice(pepper)
                    .map_err(|e| PasswordError::Pepper(e.to_string()))?;
                mac.update(password.as_bytes());
                Ok(hex::encode(mac.finalize().into_bytes()).into_bytes())
            }
        }
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let peppered = self.apply_pepper(password)?;

        let hash = self
            .argon2()?
            .hash_password(&peppered, &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?
            .to_string();

        debug!("Computed password hash");
        Ok(hash)
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
        let peppered = self.apply_pepper(password)?;

        // Parameters come from the PHC string itself
        match Argon2::default().verify_password(&peppered, &parsed_hash) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let hasher = Argon2Hasher::new(1024, None);

        let hash = hasher.hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(hasher.verify_password("secret1", &hash).unwrap());
        assert!(!hasher.verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = Argon2Hasher::new(1024, None);

        let first = hasher.hash_password("secret1").unwrap();
        let second = hasher.hash_password("secret1").unwrap();
        assert_ne!(first, second, "Each hash must carry its own salt");
    }

    #[test]
    fn test_pepper_is_required_to_verify() {
        let peppered = Argon2Hasher::new(1024, Some("server-pepper"));
        let plain = Argon2Hasher::new(1024, None);

        let hash = peppered.hash_password("secret1").unwrap();
        assert!(peppered.verify_password("secret1", &hash).unwrap());
        assert!(!plain.verify_password("secret1", &hash).unwrap());
    }

    #[test]
    fn test_empty_pepper_is_ignored() {
        let hasher = Argon2Hasher::new(1024, Some(""));
        let plain = Argon2Hasher::new(1024, None);

        let hash = hasher.hash_password("secret1").unwrap();
        assert!(plain.verify_password("secret1", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash() {
        let hasher = Argon2Hasher::new(1024, None);
        assert!(matches!(
            hasher.verify_password("secret1", "not-a-phc-string"),
            Err(PasswordError::MalformedHash(_))
        ));
    }
}
