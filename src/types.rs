//! Common type definitions.
//!
//! Entity identifiers are sequence-assigned 64-bit integers wrapped in type
//! aliases for readability at call sites. The store never reuses an
//! identifier after deletion (PostgreSQL sequences are monotonic), which is
//! what the rest of the system relies on.

/// User account identifier
pub type UserId = i64;

/// Beach identifier
pub type BeachId = i64;

/// Kiosk identifier
pub type KioskId = i64;
