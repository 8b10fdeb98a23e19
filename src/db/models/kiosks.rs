//! Database models for kiosks.

use crate::api::models::kiosks::{KioskCreate, KioskPatch, KioskReplace};
use crate::types::{BeachId, KioskId};
use chrono::{DateTime, Utc};

/// Database request for creating a kiosk. The owning beach is fixed at
/// creation time and cannot be changed afterwards.
#[derive(Debug, Clone)]
pub struct KioskCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
    pub score: Option<f64>,
    pub latitude: f64,
    pub longitude: f64,
    pub accessible: bool,
    pub has_restroom: bool,
    pub price: Option<i32>,
    pub max_occupancy: Option<i32>,
    pub beach_id: BeachId,
}

impl From<KioskCreate> for KioskCreateDBRequest {
    fn from(api: KioskCreate) -> Self {
        Self {
            name: api.name,
            description: api.description,
            score: api.score,
            latitude: api.latitude,
            longitude: api.longitude,
            accessible: api.accessible.unwrap_or(false),
            has_restroom: api.has_restroom.unwrap_or(false),
            price: api.price,
            max_occupancy: api.max_occupancy,
            beach_id: api.beach_id,
        }
    }
}

/// Database request for a full replacement of every mutable column.
/// `beach_id` is deliberately absent: kiosks are never reparented.
#[derive(Debug, Clone)]
pub struct KioskReplaceDBRequest {
    pub name: String,
    pub description: Option<String>,
    pub score: Option<f64>,
    pub latitude: f64,
    pub longitude: f64,
    pub accessible: bool,
    pub has_restroom: bool,
    pub price: Option<i32>,
    pub max_occupancy: Option<i32>,
}

impl From<KioskReplace> for KioskReplaceDBRequest {
    fn from(api: KioskReplace) -> Self {
        Self {
            name: api.name,
            description: api.description,
            score: api.score,
            latitude: api.latitude,
            longitude: api.longitude,
            accessible: api.accessible,
            has_restroom: api.has_restroom,
            price: api.price,
            max_occupancy: api.max_occupancy,
        }
    }
}

/// Database request for a sparse update. `None` fields keep their stored
/// values.
#[derive(Debug, Clone, Default)]
pub struct KioskUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub score: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accessible: Option<bool>,
    pub has_restroom: Option<bool>,
    pub price: Option<i32>,
    pub max_occupancy: Option<i32>,
}

impl From<KioskPatch> for KioskUpdateDBRequest {
    fn from(api: KioskPatch) -> Self {
        Self {
            name: api.name,
            description: api.description,
            score: api.score,
            latitude: api.latitude,
            longitude: api.longitude,
            accessible: api.accessible,
            has_restroom: api.has_restroom,
            price: api.price,
            max_occupancy: api.max_occupancy,
        }
    }
}

/// Database response for a kiosk
#[derive(Debug, Clone)]
pub struct KioskDBResponse {
    pub id: KioskId,
    pub name: String,
    pub description: Option<String>,
    pub score: Option<f64>,
    pub latitude: f64,
    pub longitude: f64,
    pub accessible: bool,
    pub has_restroom: bool,
    pub price: Option<i32>,
    pub max_occupancy: Option<i32>,
    pub beach_id: BeachId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
