//! Spherical Mercator latitude warping.
//!
//! Latitudes are mapped onto a linear axis expressed in "degrees" so that a
//! single grid step covers roughly the same ground distance in both
//! longitude and latitude:
//!
//! ```text
//! y = (180 / π) · ln(tan(π/4 + lat · π/360))
//! ```
//!
//! The function is total on the open interval (-90, 90). No validation is
//! performed: at or beyond the poles the result is huge or not a number, and
//! downstream binning treats such values as outside every grid.

use std::f64::consts::PI;

/// Project a latitude in degrees onto the Mercator y axis (also in degrees).
#[inline]
pub fn project_latitude(lat: f64) -> f64 {
    180.0 / PI * (PI / 4.0 + lat * PI / 360.0).tan().ln()
}
