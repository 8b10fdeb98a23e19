//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Authentication** (`/auth/*`): Registration, login, token refresh,
//!   current-user lookup
//! - **Beaches** (`/api/v1/beaches/*`): Beach CRUD with filtered listing
//! - **Kiosks** (`/api/v1/kiosks/*`): Kiosk CRUD with filtered listing
//!
//! Reads are public; every mutation requires a valid bearer access token.
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! API documentation is available at `/docs` when the server is running.

pub mod handlers;
pub mod models;
