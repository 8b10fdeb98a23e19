//! API request/response models.
//!
//! Incoming payloads validate their field domains (`validate()` methods)
//! before anything reaches the store, so out-of-range values fail with 400
//! rather than a database constraint error.

pub mod beaches;
pub mod kiosks;
pub mod pagination;
pub mod users;
