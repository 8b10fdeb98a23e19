//! Repository implementations for database access.
//!
//! This module provides repository structs for each major entity in the
//! system. Repositories follow a consistent pattern and implement the
//! [`Repository`] trait.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed CRUD operations
//! - Handles query construction and parameter binding
//! - Returns domain models from [`crate::db::models`]
//!
//! # Available Repositories
//!
//! - [`Beaches`]: Beach records, filtered listing, and bulk lookups
//! - [`Kiosks`]: Kiosk records, filtered listing, and per-beach grouping
//! - [`Users`]: User accounts and refresh-token rotation (bespoke methods
//!   only - no user CRUD surface exists, so the entity does not implement
//!   the full trait)
//!
//! # Common Pattern
//!
//! ```ignore
//! use orla::db::handlers::{Beaches, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = pool.acquire().await?;
//!     let mut repo = Beaches::new(&mut conn);
//!     let beaches = repo.list(&filter).await?;
//!     Ok(())
//! }
//! ```

pub mod beaches;
pub mod kiosks;
pub mod repository;
pub mod users;

pub use beaches::Beaches;
pub use kiosks::Kiosks;
pub use repository::Repository;
pub use users::Users;
