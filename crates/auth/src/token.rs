//! HS256 session tokens.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use registrar_core::UserId;

use crate::{validate_claims, JwtClaims, TokenValidationError};

/// Fixed session lifetime (30 minutes).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(1800);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, wrong algorithm, unparsable payload or impossible window.
    #[error("invalid token")]
    Invalid,

    #[error("token has expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies stateless session tokens.
///
/// There is no session store: any token with a valid signature whose window
/// contains `now` is accepted.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        // Expiry is checked by `validate_claims` against an injected clock so
        // expired and invalid tokens stay distinguishable.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(1800)),
        }
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = JwtClaims {
            sub: user_id,
            iat: now,
            exp: now + self.ttl,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::Invalid)?;

        match validate_claims(&data.claims, now) {
            Ok(()) => Ok(data.claims),
            Err(TokenValidationError::Expired) => Err(TokenError::Expired),
            Err(_) => Err(TokenError::Invalid),
        }
    }
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"test-secret", DEFAULT_TOKEN_TTL)
    }

    #[test]
    fn issued_token_verifies_and_carries_subject() {
        let svc = service();
        let user_id = UserId::new();
        let now = Utc::now();

        let token = svc.issue(user_id, now).unwrap();
        let claims = svc.verify(&token, now).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!((claims.exp - claims.iat).num_seconds(), 1800);
    }

    #[test]
    fn expiry_is_distinct_from_invalid() {
        let svc = service();
        let now = Utc::now();
        let token = svc.issue(UserId::new(), now).unwrap();

        let later = now + chrono::Duration::seconds(1801);
        assert_eq!(svc.verify(&token, later), Err(TokenError::Expired));
        assert_eq!(svc.verify("garbage", now), Err(TokenError::Invalid));
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let now = Utc::now();
        let token = TokenService::new(b"other-secret", DEFAULT_TOKEN_TTL)
            .issue(UserId::new(), now)
            .unwrap();
        assert_eq!(service().verify(&token, now), Err(TokenError::Invalid));
    }
}
