//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// A geographic bounding box in WGS84 degrees.
///
/// Also deserializes from the corner form used by older layer configs
/// (`top_left_lat`, `top_left_lon`, `bottom_right_lat`, `bottom_right_lon`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(alias = "bottom_right_lat")]
    pub min_lat: f64,
    #[serde(alias = "top_left_lat")]
    pub max_lat: f64,
    #[serde(alias = "top_left_lon")]
    pub min_lon: f64,
    #[serde(alias = "bottom_right_lon")]
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a validated bounding box.
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> GridResult<Self> {
        let bbox = Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Check that both axes are finite and strictly ordered.
    pub fn validate(&self) -> GridResult<()> {
        let values = [self.min_lat, self.max_lat, self.min_lon, self.max_lon];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GridError::InvalidBbox(format!(
                "non-finite bound in {:?}",
                self
            )));
        }
        if self.min_lat >= self.max_lat {
            return Err(GridError::InvalidBbox(format!(
                "min_lat {} must be below max_lat {}",
                self.min_lat, self.max_lat
            )));
        }
        if self.min_lon >= self.max_lon {
            return Err(GridError::InvalidBbox(format!(
                "min_lon {} must be below max_lon {}",
                self.min_lon, self.max_lon
            )));
        }
        Ok(())
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Check if a point is contained within this bbox (edges inclusive).
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Corner representation attached to exported slice metadata.
    pub fn geo_bounds(&self) -> GeoBounds {
        GeoBounds {
            top_left_lat: self.max_lat,
            top_left_lon: self.min_lon,
            bottom_right_lat: self.min_lat,
            bottom_right_lon: self.max_lon,
        }
    }
}

/// Top-left / bottom-right corners of a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub top_left_lat: f64,
    pub top_left_lon: f64,
    pub bottom_right_lat: f64,
    pub bottom_right_lon: f64,
}
