//! API request/response models for kiosks.

use super::pagination::Pagination;
use crate::db::models::kiosks::KioskDBResponse;
use crate::errors::Error;
use crate::types::{BeachId, KioskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use utoipa::{IntoParams, ToSchema};

fn check_latitude(latitude: f64) -> Result<(), Error> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(Error::BadRequest {
            message: "latitude must be between -90 and 90".to_string(),
        });
    }
    Ok(())
}

fn check_longitude(longitude: f64) -> Result<(), Error> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(Error::BadRequest {
            message: "longitude must be between -180 and 180".to_string(),
        });
    }
    Ok(())
}

fn check_common(name: Option<&str>, score: Option<f64>, price: Option<i32>, max_occupancy: Option<i32>) -> Result<(), Error> {
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(Error::BadRequest {
                message: "name must not be empty".to_string(),
            });
        }
    }
    if let Some(score) = score {
        if !(0.0..=5.0).contains(&score) {
            return Err(Error::BadRequest {
                message: "score must be between 0 and 5".to_string(),
            });
        }
    }
    if let Some(price) = price {
        if price < 0 {
            return Err(Error::BadRequest {
                message: "price must not be negative".to_string(),
            });
        }
    }
    if let Some(max_occupancy) = max_occupancy {
        if max_occupancy <= 0 {
            return Err(Error::BadRequest {
                message: "max_occupancy must be a positive integer".to_string(),
            });
        }
    }
    Ok(())
}

/// Payload for creating a kiosk. The owning beach is fixed here for the
/// kiosk's entire lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KioskCreate {
    pub name: String,
    pub description: Option<String>,
    pub score: Option<f64>,
    pub latitude: f64,
    pub longitude: f64,
    /// Defaults to false
    pub accessible: Option<bool>,
    /// Defaults to false
    pub has_restroom: Option<bool>,
    pub price: Option<i32>,
    pub max_occupancy: Option<i32>,
    pub beach_id: BeachId,
}

impl KioskCreate {
    pub fn validate(&self) -> Result<(), Error> {
        check_latitude(self.latitude)?;
        check_longitude(self.longitude)?;
        check_common(Some(self.name.as_str()), self.score, self.price, self.max_occupancy)
    }
}

/// Payload for a full replacement. Every mutable field must be supplied;
/// unknown fields are rejected rather than silently ignored. There is no
/// `beach_id` here - kiosks are never reparented.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct KioskReplace {
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

impl KioskReplace {
    pub fn validate(&self) -> Result<(), Error> {
        check_latitude(self.latitude)?;
        check_longitude(self.longitude)?;
        check_common(Some(self.name.as_str()), self.score, self.price, self.max_occupancy)
    }
}

/// Payload for a partial update. Absent fields keep their stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct KioskPatch {
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

impl KioskPatch {
    /// True when the payload, after dropping absent fields, is empty
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.score.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.accessible.is_none()
            && self.has_restroom.is_none()
            && self.price.is_none()
            && self.max_occupancy.is_none()
    }

    pub fn validate(&self) -> Result<(), Error> {
        if let Some(latitude) = self.latitude {
            check_latitude(latitude)?;
        }
        if let Some(longitude) = self.longitude {
            check_longitude(longitude)?;
        }
        check_common(self.name.as_deref(), self.score, self.price, self.max_occupancy)
    }
}

/// Kiosk response, optionally eagerly including the parent beach
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KioskResponse {
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
    /// Parent beach (only included on kiosk listings/retrievals)
    /// Note: no_recursion is important! utoipa will panic at runtime,
    /// because it overflows the stack trying to follow the relationship.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(no_recursion)]
    pub beach: Option<crate::api::models::beaches::BeachResponse>,
}

impl From<KioskDBResponse> for KioskResponse {
    fn from(db: KioskDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            score: db.score,
            latitude: db.latitude,
            longitude: db.longitude,
            accessible: db.accessible,
            has_restroom: db.has_restroom,
            price: db.price,
            max_occupancy: db.max_occupancy,
            beach_id: db.beach_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
            beach: None, // By default, relationships are not included
        }
    }
}

impl KioskResponse {
    /// Attach the eager-loaded parent beach
    pub fn with_beach(mut self, beach: crate::api::models::beaches::BeachResponse) -> Self {
        self.beach = Some(beach);
        self
    }
}

/// Query parameters for listing kiosks
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListKiosksQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only kiosks belonging to this beach
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub beach_id: Option<BeachId>,

    /// Filter on the accessibility flag
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub accessible: Option<bool>,

    /// Filter on the restroom flag
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub has_restroom: Option<bool>,

    /// Inclusive lower bound on score
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub min_score: Option<f64>,

    /// Inclusive upper bound on score
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub max_score: Option<f64>,

    /// Inclusive upper bound on price
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub max_price: Option<i32>,
}
