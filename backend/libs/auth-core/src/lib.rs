//! Signed credential issuing and verification.
//!
//! Credentials are HS256 JWTs carrying a single identity claim (`sub`) plus
//! the standard `iat`/`exp` timestamps. The signing secret is process-wide
//! configuration and is never taken from a request. Verification is a pure
//! function of the token, the secret and the current time.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims embedded in a Tavola credential
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Identity extracted from a successfully verified credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub subject: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Credential failures, distinguishable so callers can report them apart
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    /// Structure or signature invalid
    #[error("Invalid token")]
    InvalidToken,
    /// Signature valid but expiration in the past
    #[error("Token expired, please login again")]
    TokenExpired,
    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Issue a signed credential for `subject`, valid for `ttl`.
pub fn issue_token(subject: Uuid, secret: &str, ttl: Duration) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: subject.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    encode(
        &Header::new(JWT_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Verify a credential and extract the identity it carries.
///
/// Confirms the signature and expiration as of call time. An expired but
/// otherwise valid token yields `AuthError::TokenExpired`; everything else
/// that fails yields `AuthError::InvalidToken`.
pub fn verify_token(token: &str, secret: &str) -> Result<VerifiedIdentity, AuthError> {
    let validation = Validation::new(JWT_ALGORITHM);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    let subject = Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidToken)?;
    let expires_at = Utc
        .timestamp_opt(data.claims.exp, 0)
        .single()
        .ok_or(AuthError::InvalidToken)?;

    Ok(VerifiedIdentity {
        subject,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issue_then_verify_returns_subject() {
        let subject = Uuid::new_v4();
        let token = issue_token(subject, SECRET, Duration::hours(1)).unwrap();

        let identity = verify_token(&token, SECRET).unwrap();
        assert_eq!(identity.subject, subject);
        assert!(identity.expires_at > Utc::now());
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = issue_token(Uuid::new_v4(), SECRET, Duration::hours(1)).unwrap();
        assert_eq!(
            verify_token(&token, "other-secret").unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn garbage_token_is_invalid() {
        assert_eq!(
            verify_token("not.a.token", SECRET).unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn expired_token_is_distinguishable() {
        // Well past the default validation leeway
        let token = issue_token(Uuid::new_v4(), SECRET, Duration::hours(-2)).unwrap();
        assert_eq!(
            verify_token(&token, SECRET).unwrap_err(),
            AuthError::TokenExpired
        );
    }

    #[test]
    fn non_uuid_subject_is_invalid() {
        let now = Utc::now();
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(JWT_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            verify_token(&token, SECRET).unwrap_err(),
            AuthError::InvalidToken
        );
    }
}
