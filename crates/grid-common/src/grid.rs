//! Regular grid geometry used for spatial binning.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// Raw output of a grid sizing routine, before latitude projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSizing {
    /// Number of cells along longitude
    pub x_size: usize,
    /// Number of cells along latitude
    pub y_size: usize,
    /// Longitude of the grid origin
    pub origin_lon: f64,
    /// Latitude of the grid origin, unprojected
    pub origin_lat: f64,
    /// Cell step, shared by both axes
    pub step: f64,
}

/// Fixed grid dimensions, origin and step.
///
/// `min_lat` is stored in the same space record latitudes are binned in,
/// i.e. already projected when the projection is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub x_size: usize,
    pub y_size: usize,
    pub min_lon: f64,
    pub min_lat: f64,
    pub step: f64,
}

impl GridGeometry {
    /// Build the geometry from a sizing result, projecting the origin latitude
    /// when `project` is set.
    pub fn from_sizing(sizing: GridSizing, project: bool) -> GridResult<Self> {
        if sizing.x_size == 0 || sizing.y_size == 0 {
            return Err(GridError::InvalidGeometry(format!(
                "grid size must be positive, got {}x{}",
                sizing.x_size, sizing.y_size
            )));
        }
        if !(sizing.step.is_finite() && sizing.step > 0.0) {
            return Err(GridError::InvalidGeometry(format!(
                "step must be a positive number, got {}",
                sizing.step
            )));
        }

        let min_lat = if project {
            projection::project_latitude(sizing.origin_lat)
        } else {
            sizing.origin_lat
        };
        if !min_lat.is_finite() || !sizing.origin_lon.is_finite() {
            return Err(GridError::InvalidGeometry(format!(
                "origin ({}, {}) is not finite",
                sizing.origin_lon, sizing.origin_lat
            )));
        }

        Ok(Self {
            x_size: sizing.x_size,
            y_size: sizing.y_size,
            min_lon: sizing.origin_lon,
            min_lat,
            step: sizing.step,
        })
    }

    /// Total number of cells; the length of every slice buffer.
    pub fn area(&self) -> usize {
        self.x_size * self.y_size
    }

    /// Row-major linear index of a cell.
    pub fn flat_index(&self, lon_index: usize, lat_index: usize) -> usize {
        lat_index * self.x_size + lon_index
    }
}
