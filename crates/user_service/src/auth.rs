//! Password hashing and token issuing.

use crate::error::{Result, UserServiceError};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use common::TokenClaims;
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::rngs::OsRng;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| UserServiceError::PasswordHash(e.to_string()))?
        .to_string();
    Ok(hash)
}

/// Check a password against a stored hash.
pub fn verify_password(stored_hash: &str, supplied_password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(supplied_password.as_bytes(), &parsed)
        .is_ok()
}

/// Signs the bearer tokens the relay accepts.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    ttl_hours: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    /// Issue a signed token for an identity.
    pub fn issue(&self, identity: &str, email: &str) -> Result<String> {
        let claims = TokenClaims::new(identity, email, self.ttl_hours);
        let token = encode(&Header::default(), &claims, &self.key)?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn test_hash_then_verify_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password(&hash, "hunter2"));
        assert!(!verify_password(&hash, "hunter3"));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("not-a-phc-string", "hunter2"));
    }

    #[test]
    fn test_issued_token_decodes_with_same_secret() {
        let issuer = TokenIssuer::new("secret", 24);
        let token = issuer.issue("user_abc", "abc@example.com").unwrap();

        let decoded = decode::<TokenClaims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, "user_abc");
        assert_eq!(decoded.claims.email, "abc@example.com");
    }
}
