//! Axum route handlers.
//!
//! Handlers parse and validate request data, delegate to the repositories
//! in [`crate::db::handlers`], and translate results back into HTTP
//! responses. Each handler acquires its own connection (or transaction)
//! from the pool for the duration of the request.

pub mod auth;
pub mod beaches;
pub mod kiosks;
