//! Cryptographic logics: password hashing and reset-token digests.

use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Argon2, Params, Version};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use validator::{ValidationError, ValidationErrors};
use zeroize::Zeroizing;

use crate::config::Argon2 as ArgonConfig;

/// Bytes of entropy behind a password-reset token.
const RESET_TOKEN_LENGTH: usize = 32;

type Result<T> = std::result::Result<T, CryptoError>;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),
}

/// Cryptographic manager.
pub struct Crypto {
    pub pwd: PasswordManager,
    pub hasher: Hasher,
}

impl Crypto {
    /// Create a new [`Crypto`].
    pub fn new(
        config: Option<ArgonConfig>,
        pepper: impl AsRef<[u8]>,
    ) -> Result<Self> {
        Ok(Self {
            pwd: PasswordManager::new(config)?,
            hasher: Hasher::new(pepper),
        })
    }
}

/// Password manager that uses Argon2id and PHC string format for hashing and
/// verification.
pub struct PasswordManager {
    params: Params,
}

impl PasswordManager {
    /// Create a new [`PasswordManager`].
    pub fn new(config: Option<ArgonConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();

        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(Self { params })
    }

    /// Hash password using Argon2id.
    pub fn hash_password(&self, password: impl AsRef<[u8]>) -> Result<String> {
        let argon2 = Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        );
        let salt = SaltString::generate(&mut OsRng);
        let hash = argon2
            .hash_password(password.as_ref(), &salt)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        Ok(hash.to_string())
    }

    fn invalid_password() -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.add(
            "password",
            ValidationError::new("invalid_password")
                .with_message("Invalid password.".into()),
        );
        errors
    }

    /// Verify password against a PHC.
    pub fn verify_password(
        &self,
        password: impl AsRef<[u8]>,
        phc_hash: impl ToString,
    ) -> std::result::Result<(), ValidationErrors> {
        let argon2 = Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        );
        let phc_hash = phc_hash.to_string();

        let parsed = PasswordHash::new(&phc_hash)
            .map_err(|_| Self::invalid_password())?;

        argon2
            .verify_password(password.as_ref(), &parsed)
            .map_err(|_| Self::invalid_password())
    }
}

/// Peppered SHA-256 digester. Only digests are persisted, so a leaked
/// database row is not enough to redeem a reset token.
pub struct Hasher(Zeroizing<Vec<u8>>);

impl Hasher {
    /// Create a new [`Hasher`].
    pub fn new(pepper: impl AsRef<[u8]>) -> Self {
        Self(Zeroizing::new(pepper.as_ref().to_vec()))
    }

    /// Digest data into SHA256.
    pub fn digest(&self, data: impl AsRef<[u8]>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.0);
        hasher.update(&data);
        let hash = hasher.finalize();

        hex::encode(hash)
    }
}

/// Generate a fresh password-reset token. The caller mails the clear token
/// and persists only its digest.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> ArgonConfig {
        ArgonConfig {
            memory_cost: 1024,
            iterations: 1,
            parallelism: 1,
            hash_length: 32,
        }
    }

    #[test]
    fn hash_then_verify_round_trips() {
        let pwd = PasswordManager::new(Some(fast_config())).unwrap();

        let phc = pwd.hash_password("P$soW%920$n&").unwrap();
        assert!(phc.starts_with("$argon2id$"));
        assert!(pwd.verify_password("P$soW%920$n&", &phc).is_ok());
        assert!(pwd.verify_password("wrong-password", &phc).is_err());
    }

    #[test]
    fn verify_rejects_garbage_phc() {
        let pwd = PasswordManager::new(Some(fast_config())).unwrap();
        assert!(pwd.verify_password("whatever", "not-a-phc-string").is_err());
    }

    #[test]
    fn digest_is_stable_and_peppered() {
        let a = Hasher::new(b"pepper-a");
        let b = Hasher::new(b"pepper-b");

        assert_eq!(a.digest("token"), a.digest("token"));
        assert_ne!(a.digest("token"), b.digest("token"));
        assert_eq!(a.digest("token").len(), 64);
    }

    #[test]
    fn reset_tokens_are_unique_hex() {
        let token = generate_reset_token();
        assert_eq!(token.len(), RESET_TOKEN_LENGTH * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_reset_token());
    }
}
