//! Database record models matching table schemas.
//!
//! This module contains struct definitions that directly correspond to
//! database table rows. These models are used by repositories to return
//! query results and accept insertion/update data.
//!
//! Database models are distinct from API models so that storage and API
//! representations can evolve independently; conversions between the two
//! live next to the database types.

pub mod beaches;
pub mod kiosks;
pub mod users;
