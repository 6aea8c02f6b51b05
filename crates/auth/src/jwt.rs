//! HS256 bearer-token verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

/// Verifies a compact JWT and returns its claims.
///
/// `now` is passed in so time-window checks stay deterministic in tests.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp/iat are checked by validate_claims against the caller's clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl core::fmt::Debug for Hs256JwtValidator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256JwtValidator").finish_non_exhaustive()
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use stockroom_core::UserId;

    const SECRET: &[u8] = b"test-secret";

    fn mint(secret: &[u8], iat: i64, exp: i64) -> (UserId, String) {
        let sub = UserId::new();
        let claims = JwtClaims {
            sub,
            role: Role::Manager,
            iat,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret))
            .unwrap();
        (sub, token)
    }

    #[test]
    fn accepts_a_token_signed_with_the_shared_secret() {
        let now = Utc::now();
        let (sub, token) = mint(SECRET, now.timestamp() - 10, now.timestamp() + 600);
        let claims = Hs256JwtValidator::new(SECRET).validate(&token, now).unwrap();
        assert_eq!(claims.sub, sub);
        assert_eq!(claims.role, Role::Manager);
    }

    #[test]
    fn rejects_a_foreign_signature() {
        let now = Utc::now();
        let (_, token) = mint(b"other", now.timestamp() - 10, now.timestamp() + 600);
        let err = Hs256JwtValidator::new(SECRET).validate(&token, now).unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));
    }

    #[test]
    fn rejects_an_expired_token() {
        let now = Utc::now();
        let (_, token) = mint(SECRET, now.timestamp() - 600, now.timestamp() - 1);
        assert_eq!(
            Hs256JwtValidator::new(SECRET).validate(&token, now),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn rejects_garbage() {
        let err = Hs256JwtValidator::new(SECRET)
            .validate("not-a-jwt", Utc::now())
            .unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));
    }
}
