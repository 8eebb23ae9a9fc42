//! Bearer-token claims shared by the issuer and the relay's verifier.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// Claim set carried in a bearer token.
///
/// `sub` is the user identity every service keys on; `email` rides along
/// for the notifier. `exp` is seconds since the Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub email: String,
    pub exp: i64,
}

impl TokenClaims {
    /// Build claims for a user, expiring `ttl_hours` from now.
    pub fn new(identity: impl Into<String>, email: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            sub: identity.into(),
            email: email.into(),
            exp: (Utc::now() + Duration::hours(ttl_hours)).timestamp(),
        }
    }
}
