//! API request/response models for beaches.

use super::pagination::Pagination;
use crate::api::models::kiosks::KioskResponse;
use crate::db::models::beaches::BeachDBResponse;
use crate::errors::Error;
use crate::types::BeachId;
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

fn check_common(
    name: Option<&str>,
    state: Option<&str>,
    length: Option<i32>,
    width: Option<i32>,
    rating: Option<f64>,
) -> Result<(), Error> {
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(Error::BadRequest {
                message: "name must not be empty".to_string(),
            });
        }
    }
    if let Some(state) = state {
        if state.chars().count() != 2 {
            return Err(Error::BadRequest {
                message: "state must be a two-letter code".to_string(),
            });
        }
    }
    if let Some(length) = length {
        if length <= 0 {
            return Err(Error::BadRequest {
                message: "length must be a positive integer".to_string(),
            });
        }
    }
    if let Some(width) = width {
        if width <= 0 {
            return Err(Error::BadRequest {
                message: "width must be a positive integer".to_string(),
            });
        }
    }
    if let Some(rating) = rating {
        if !(0.0..=5.0).contains(&rating) {
            return Err(Error::BadRequest {
                message: "rating must be between 0 and 5".to_string(),
            });
        }
    }
    Ok(())
}

/// Payload for creating a beach
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BeachCreate {
    pub name: String,
    /// Two-letter state code
    pub state: String,
    pub municipality: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Extent in metres
    pub length: Option<i32>,
    pub width: Option<i32>,
    /// Defaults to true
    pub has_bathing_area: Option<bool>,
    /// Defaults to false
    pub has_lifeguard: Option<bool>,
    pub rating: Option<f64>,
}

impl BeachCreate {
    pub fn validate(&self) -> Result<(), Error> {
        check_latitude(self.latitude)?;
        check_longitude(self.longitude)?;
        check_common(Some(self.name.as_str()), Some(self.state.as_str()), self.length, self.width, self.rating)
    }
}

/// Payload for a full replacement. Every mutable field must be supplied;
/// unknown fields are rejected rather than silently ignored.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BeachReplace {
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

impl BeachReplace {
    pub fn validate(&self) -> Result<(), Error> {
        check_latitude(self.latitude)?;
        check_longitude(self.longitude)?;
        check_common(Some(self.name.as_str()), Some(self.state.as_str()), self.length, self.width, self.rating)
    }
}

/// Payload for a partial update. Absent fields keep their stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BeachPatch {
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

impl BeachPatch {
    /// True when the payload, after dropping absent fields, is empty
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.state.is_none()
            && self.municipality.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.length.is_none()
            && self.width.is_none()
            && self.has_bathing_area.is_none()
            && self.has_lifeguard.is_none()
            && self.rating.is_none()
    }

    pub fn validate(&self) -> Result<(), Error> {
        if let Some(latitude) = self.latitude {
            check_latitude(latitude)?;
        }
        if let Some(longitude) = self.longitude {
            check_longitude(longitude)?;
        }
        check_common(self.name.as_deref(), self.state.as_deref(), self.length, self.width, self.rating)
    }
}

/// Beach response, eagerly including the beach's kiosks
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BeachResponse {
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
    /// Kiosks belonging to this beach.
    /// Note: no_recursion is important! utoipa will panic at runtime,
    /// because it overflows the stack trying to follow the relationship.
    #[schema(no_recursion)]
    pub kiosks: Vec<KioskResponse>,
}

impl From<BeachDBResponse> for BeachResponse {
    fn from(db: BeachDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            state: db.state,
            municipality: db.municipality,
            latitude: db.latitude,
            longitude: db.longitude,
            length: db.length,
            width: db.width,
            has_bathing_area: db.has_bathing_area,
            has_lifeguard: db.has_lifeguard,
            rating: db.rating,
            created_at: db.created_at,
            updated_at: db.updated_at,
            kiosks: Vec::new(),
        }
    }
}

impl BeachResponse {
    /// Attach the eager-loaded kiosks
    pub fn with_kiosks(mut self, kiosks: Vec<KioskResponse>) -> Self {
        self.kiosks = kiosks;
        self
    }
}

/// Query parameters for listing beaches
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListBeachesQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only beaches in this two-letter state code
    pub state: Option<String>,

    /// Only beaches in this municipality
    pub municipality: Option<String>,

    /// Filter on the bathing-area flag
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub has_bathing_area: Option<bool>,

    /// Filter on the lifeguard flag
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub has_lifeguard: Option<bool>,

    /// Only beaches with (true) or without (false) at least one kiosk
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub has_kiosks: Option<bool>,

    /// Inclusive lower bound on rating
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub min_rating: Option<f64>,

    /// Inclusive upper bound on rating
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub max_rating: Option<f64>,

    /// Inclusive lower bound on length (metres)
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub min_length: Option<i32>,

    /// Inclusive upper bound on length (metres)
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub max_length: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create() -> BeachCreate {
        BeachCreate {
            name: "Praia do Sancho".to_string(),
            state: "PE".to_string(),
            municipality: "Fernando de Noronha".to_string(),
            latitude: -3.855,
            longitude: -32.443056,
            length: Some(300),
            width: Some(30),
            has_bathing_area: Some(true),
            has_lifeguard: Some(false),
            rating: Some(5.0),
        }
    }

    #[test]
    fn test_valid_payload_passes() {
        assert!(valid_create().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_fields_fail() {
        let mut create = valid_create();
        create.latitude = 91.0;
        assert!(create.validate().is_err());

        let mut create = valid_create();
        create.longitude = -200.0;
        assert!(create.validate().is_err());

        let mut create = valid_create();
        create.rating = Some(5.1);
        assert!(create.validate().is_err());

        let mut create = valid_create();
        create.length = Some(0);
        assert!(create.validate().is_err());

        let mut create = valid_create();
        create.state = "CEA".to_string();
        assert!(create.validate().is_err());
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(BeachPatch::default().is_empty());
        let patch = BeachPatch {
            rating: Some(4.0),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_replace_rejects_unknown_fields() {
        let result: Result<BeachReplace, _> = serde_json::from_value(serde_json::json!({
            "name": "Praia do Sancho",
            "state": "PE",
            "municipality": "Fernando de Noronha",
            "latitude": -3.855,
            "longitude": -32.443056,
            "has_bathing_area": true,
            "has_lifeguard": false,
            "surprise": "field"
        }));
        assert!(result.is_err());
    }
}
