//! Authentication system.
//!
//! This module provides username/password authentication with a two-token
//! scheme:
//!
//! # Authentication Flow
//!
//! 1. **Register** - `POST /auth/register` stores a new user with an
//!    Argon2id password hash. The clear-text password never leaves the
//!    handler.
//! 2. **Login** - `POST /auth/login` verifies the password and issues a
//!    pair of HS256-signed JWTs: a short-lived access token and a
//!    longer-lived refresh token. The refresh token is persisted on the
//!    user row as the single valid instance.
//! 3. **Bearer access** - protected endpoints extract the access token from
//!    the `Authorization: Bearer` header and resolve the subject to a
//!    stored user. Missing, malformed, expired, or wrong-kind tokens all
//!    fail with 401 and a `WWW-Authenticate: Bearer` challenge.
//! 4. **Refresh** - `POST /auth/refresh` exchanges a valid refresh token
//!    for a new pair. The supplied token must match the stored one
//!    byte-for-byte, so a superseded token can never be replayed.
//!
//! # Modules
//!
//! - [`current_user`]: Extractor for the authenticated user in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`token`]: Access/refresh token creation and verification

pub mod current_user;
pub mod password;
pub mod token;
