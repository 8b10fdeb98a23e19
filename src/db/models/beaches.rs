//! Database models for beaches.

use crate::api::models::beaches::{BeachCreate, BeachPatch, BeachReplace};
use crate::types::BeachId;
use chrono::{DateTime, Utc};

/// Database request for creating a beach. Also used for full replacement,
/// where every mutable column is overwritten with the supplied value.
#[derive(Debug, Clone)]
pub struct BeachCreateDBRequest {
    pub name: String,
    pub state: String,
    pub municipality: String,
    pub latitude: f64,
    pub longitude: f64,
    pub length: Option<i32>,
    pub width: Option<i32>,
    pub has_bathing_area: bool,
    pub has_lifeguard: bool,
    pub rating: Option<f64>,
}

impl From<BeachCreate> for BeachCreateDBRequest {
    fn from(api: BeachCreate) -> Self {
        Self {
            name: api.name,
            state: api.state,
            municipality: api.municipality,
            latitude: api.latitude,
            longitude: api.longitude,
            length: api.length,
            width: api.width,
            has_bathing_area: api.has_bathing_area.unwrap_or(true),
            has_lifeguard: api.has_lifeguard.unwrap_or(false),
            rating: api.rating,
        }
    }
}

impl From<BeachReplace> for BeachCreateDBRequest {
    fn from(api: BeachReplace) -> Self {
        Self {
            name: api.name,
            state: api.state,
            municipality: api.municipality,
            latitude: api.latitude,
            longitude: api.longitude,
            length: api.length,
            width: api.width,
            has_bathing_area: api.has_bathing_area,
            has_lifeguard: api.has_lifeguard,
            rating: api.rating,
        }
    }
}

/// Database request for a sparse update. `None` fields keep their stored
/// values.
#[derive(Debug, Clone, Default)]
pub struct BeachUpdateDBRequest {
    pub name: Option<String>,
    pub state: Option<String>,
    pub municipality: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub length: Option<i32>,
    pub width: Option<i32>,
    pub has_bathing_area: Option<bool>,
    pub has_lifeguard: Option<bool>,
    pub rating: Option<f64>,
}

impl From<BeachPatch> for BeachUpdateDBRequest {
    fn from(api: BeachPatch) -> Self {
        Self {
            name: api.name,
            state: api.state,
            municipality: api.municipality,
            latitude: api.latitude,
            longitude: api.longitude,
            length: api.length,
            width: api.width,
            has_bathing_area: api.has_bathing_area,
            has_lifeguard: api.has_lifeguard,
            rating: api.rating,
        }
    }
}

/// Database response for a beach
#[derive(Debug, Clone)]
pub struct BeachDBResponse {
    pub id: BeachId,
    pub name: String,
    pub state: String,
    pub municipality: String,
    pub latitude: f64,
    pub longitude: f64,
    pub length: Option<i32>,
    pub width: Option<i32>,
    pub has_bathing_area: bool,
    pub has_lifeguard: bool,
    pub rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
