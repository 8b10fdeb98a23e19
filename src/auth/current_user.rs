//! Extractor for the authenticated user.
//!
//! Any handler can take a [`CurrentUser`] argument to require a valid
//! bearer access token. Extraction fails with 401 (and a
//! `WWW-Authenticate: Bearer` challenge) when the header is missing, the
//! token does not verify, it is not an access token, or its subject no
//! longer resolves to a stored user.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

use crate::{
    api::models::users::CurrentUser,
    auth::token::{self, TokenKind},
    db::handlers::Users,
    errors::{Error, Result},
    AppState,
};

/// Pull the bearer credential out of the Authorization header.
/// Returns None when the header is absent or not a Bearer scheme.
fn extract_bearer_token(parts: &Parts) -> Result<Option<&str>> {
    let auth_header = match parts.headers.get(axum::http::header::AUTHORIZATION) {
        Some(header) => header,
        None => return Ok(None),
    };

    let auth_str = auth_header.to_str().map_err(|e| Error::BadRequest {
        message: format!("Invalid authorization header: {e}"),
    })?;

    Ok(auth_str.strip_prefix("Bearer "))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = extract_bearer_token(parts)?.ok_or_else(|| Error::Unauthenticated {
            message: Some("Authentication credentials were not provided".to_string()),
        })?;

        let claims = token::decode_token_of_kind(token, TokenKind::Access, &state.config).map_err(|e| match e {
            Error::Unauthenticated { .. } => Error::Unauthenticated {
                message: Some("Invalid or expired token".to_string()),
            },
            other => other,
        })?;

        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut user_repo = Users::new(&mut conn);

        let user = user_repo
            .get_by_id(claims.sub)
            .await?
            .ok_or_else(|| Error::Unauthenticated {
                message: Some("Token subject no longer exists".to_string()),
            })?;

        trace!("Authenticated user: {}", user.username);

        Ok(CurrentUser {
            id: user.id,
            username: user.username,
        })
    }
}
