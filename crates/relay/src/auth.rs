//! Bearer-token verification for the connection handshake.

use crate::error::{RelayError, Result};
use common::TokenClaims;
use jsonwebtoken::{decode, DecodingKey, Validation};

/// Verifies bearer tokens presented in auth frames.
///
/// Pure over (token, secret): no state beyond the decoding key, safe to
/// share across sessions.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier for HS256 tokens signed with `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Verify a token and return its claims.
    ///
    /// Rejects malformed tokens, bad signatures, expired tokens and tokens
    /// without a subject.
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let data = decode::<TokenClaims>(token, &self.key, &self.validation)?;
        if data.claims.sub.is_empty() {
            return Err(RelayError::InvalidToken("token has no subject".to_string()));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn sign(claims: &TokenClaims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_verifies() {
        let token = sign(&TokenClaims::new("user_1", "a@example.com", 1), SECRET);
        let claims = TokenVerifier::new(SECRET).verify(&token).unwrap();
        assert_eq!(claims.sub, "user_1");
        assert_eq!(claims.email, "a@example.com");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = sign(&TokenClaims::new("user_1", "a@example.com", 1), "other");
        assert!(TokenVerifier::new(SECRET).verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Well past the validator's default leeway.
        let claims = TokenClaims {
            sub: "user_1".to_string(),
            email: "a@example.com".to_string(),
            exp: Utc::now().timestamp() - 600,
        };
        let token = sign(&claims, SECRET);
        assert!(TokenVerifier::new(SECRET).verify(&token).is_err());
    }

    #[test]
    fn test_empty_subject_rejected() {
        let token = sign(&TokenClaims::new("", "a@example.com", 1), SECRET);
        let err = TokenVerifier::new(SECRET).verify(&token).unwrap_err();
        assert!(matches!(err, RelayError::InvalidToken(_)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(TokenVerifier::new(SECRET).verify("not-a-jwt").is_err());
    }
}
