//! Manage json web tokens.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

const DEFAULT_AUDIENCE: &str = "rent.example.org";

/// Token lifetime, in seconds.
pub const EXPIRATION_TIME: u64 = 60 * 60 * 24;

/// Pieces of information asserted on a JWT.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Recipients that the JWT is intended for.
    pub aud: String,
    /// Identifies the expiration time on or after which the JWT must not be
    /// accepted for processing.
    pub exp: u64,
    /// Identifies the time at which the JWT was issued.
    pub iat: u64,
    /// Identifies the organization that issued the JWT.
    pub iss: String,
    /// User ID.
    pub sub: String,
}

/// Manage JWT tokens, signed with a shared secret.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    name: String,
    audience: String,
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance.
    pub fn new(name: &str, secret: &str) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            name: name.to_owned(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }

    /// Set `audience` field on JWT.
    pub fn audience(&mut self, audience: &str) {
        self.audience = audience.to_owned();
    }

    /// Create a new [`jsonwebtoken`].
    pub fn create(&self, user_id: &str) -> Result<String> {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let header = Header::new(self.algorithm);
        let claims = Claims {
            aud: self.audience.clone(),
            exp: time + EXPIRATION_TIME,
            iat: time,
            iss: self.name.clone(),
            sub: user_id.to_owned(),
        };

        Ok(encode(&header, &claims, &self.encoding_key)?)
    }

    /// Decode and check a token.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(self.algorithm);
        Ok(decode::<Claims>(token, &self.decoding_key, &validation)?.claims)
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("algorithm", &self.algorithm)
            .field("name", &self.name)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_decode_round_trips() {
        let manager = TokenManager::new("renta.test", "not-a-real-secret");
        let token = manager.create("2b6c9b5e-8c4a-4b61-9e0f-0f9d3a2b1c4d").unwrap();

        let claims = manager.decode(&token).unwrap();
        assert_eq!(claims.sub, "2b6c9b5e-8c4a-4b61-9e0f-0f9d3a2b1c4d");
        assert_eq!(claims.iss, "renta.test");
        assert_eq!(claims.exp, claims.iat + EXPIRATION_TIME);
    }

    #[test]
    fn decode_rejects_foreign_signature() {
        let ours = TokenManager::new("renta.test", "secret-a");
        let theirs = TokenManager::new("renta.test", "secret-b");

        let token = theirs.create("someone").unwrap();
        assert!(ours.decode(&token).is_err());
    }
}
