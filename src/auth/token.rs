//! Access and refresh token creation and verification.
//!
//! Both token kinds are HS256-signed JWTs carrying the subject's user id and
//! issuance/expiry timestamps, so they cannot be forged or altered
//! undetected. Access tokens are short-lived; refresh tokens live much
//! longer and are additionally pinned to the user row (see the auth
//! handlers).

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::Config, errors::Error, types::UserId};

/// Which of the two token kinds a claim set belongs to. Encoded in the
/// token so a refresh token can never stand in for an access token (or
/// vice versa).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,     // Subject (user ID)
    pub kind: TokenKind, // Access or refresh
    pub jti: Uuid,       // Unique token id
    pub exp: i64,        // Expiration time
    pub iat: i64,        // Issued at
}

impl Claims {
    /// Create new claims for a user and token kind. The jti makes every
    /// issued token distinct even when timestamps coincide, so rotating a
    /// refresh token always invalidates the previous one.
    pub fn new(user_id: UserId, kind: TokenKind, config: &Config) -> Self {
        let now = Utc::now();
        let expiry = match kind {
            TokenKind::Access => config.auth.security.access_token_expiry,
            TokenKind::Refresh => config.auth.security.refresh_token_expiry,
        };
        let exp = now + expiry;

        Self {
            sub: user_id,
            kind,
            jti: Uuid::new_v4(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// A freshly issued access/refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "JWT tokens: secret_key is required".to_string(),
    })
}

/// Create a signed token of the given kind for a user
pub fn create_token(user_id: UserId, kind: TokenKind, config: &Config) -> Result<String, Error> {
    let claims = Claims::new(user_id, kind, config);
    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());

    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Issue a fresh access/refresh token pair for a user
pub fn issue_token_pair(user_id: UserId, config: &Config) -> Result<TokenPair, Error> {
    Ok(TokenPair {
        access_token: create_token(user_id, TokenKind::Access, config)?,
        refresh_token: create_token(user_id, TokenKind::Refresh, config)?,
    })
}

/// Verify and decode a token, checking signature and expiry
pub fn decode_token(token: &str, config: &Config) -> Result<Claims, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },

        // Server errors (500) - key issues, internal failures
        jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_)
        | jsonwebtoken::errors::ErrorKind::RsaFailedSigning
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
        | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
        | jsonwebtoken::errors::ErrorKind::MissingAlgorithm
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },

        // Catch-all for any future error variants (default to server error for safety)
        _ => Error::Internal {
            operation: format!("JWT verification (unknown error): {e}"),
        },
    })?;

    Ok(token_data.claims)
}

/// Verify a token and require it to be of the given kind
pub fn decode_token_of_kind(token: &str, kind: TokenKind, config: &Config) -> Result<Claims, Error> {
    let claims = decode_token(token, config)?;
    if claims.kind != kind {
        return Err(Error::Unauthenticated { message: None });
    }
    Ok(claims)
}
