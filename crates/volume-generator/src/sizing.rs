//! Grid sizing collaborators.
//!
//! Sizing a grid from physical ground distance needs a geodesy routine and
//! lives outside this crate; the sizers here cover precomputed geometry and
//! explicit resolutions.

use grid_common::{BoundingBox, GridSizing};

use crate::error::{GeneratorError, Result};

/// Computes grid dimensions, origin and step for a bounding box.
pub trait GeometrySizer: Send + Sync {
    fn size_grid(
        &self,
        bbox: &BoundingBox,
        cell_size: f64,
        resolution: Option<(usize, usize)>,
    ) -> Result<GridSizing>;
}

/// Returns sizing computed elsewhere, ignoring its inputs.
#[derive(Debug, Clone, Copy)]
pub struct FixedSizer(pub GridSizing);

impl GeometrySizer for FixedSizer {
    fn size_grid(&self, _: &BoundingBox, _: f64, _: Option<(usize, usize)>) -> Result<GridSizing> {
        Ok(self.0)
    }
}

/// Derives the step from an explicit `(x_size, y_size)` resolution.
///
/// `step = round(width / x_size, 5)`, origin at the bbox south-west corner.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionSizer;

impl GeometrySizer for ResolutionSizer {
    fn size_grid(
        &self,
        bbox: &BoundingBox,
        _cell_size: f64,
        resolution: Option<(usize, usize)>,
    ) -> Result<GridSizing> {
        let (x_size, y_size) = resolution.ok_or_else(|| {
            GeneratorError::Geometry(
                "no resolution given; physical cell sizing needs an external sizer".to_string(),
            )
        })?;
        if x_size == 0 || y_size == 0 {
            return Err(GeneratorError::Geometry(format!(
                "resolution must be positive, got {}x{}",
                x_size, y_size
            )));
        }

        let step = round_to(bbox.width().abs() / x_size as f64, 5);
        if step <= 0.0 {
            return Err(GeneratorError::Geometry(format!(
                "step rounds to zero for {}x{} over {:?}",
                x_size, y_size, bbox
            )));
        }

        Ok(GridSizing {
            x_size,
            y_size,
            origin_lon: bbox.min_lon,
            origin_lat: bbox.min_lat,
            step,
        })
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_sizer() {
        let bbox = BoundingBox::new(39.544, 39.989, -105.264, -104.636).unwrap();
        let sizing = ResolutionSizer.size_grid(&bbox, 100.0, Some((537, 681))).unwrap();
        assert_eq!(sizing.x_size, 537);
        assert_eq!(sizing.y_size, 681);
        assert_eq!(sizing.origin_lon, -105.264);
        assert_eq!(sizing.origin_lat, 39.544);
        assert!((sizing.step - 0.00117).abs() < 1e-12);
    }

    #[test]
    fn test_resolution_sizer_requires_resolution() {
        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0).unwrap();
        assert!(ResolutionSizer.size_grid(&bbox, 100.0, None).is_err());
        assert!(ResolutionSizer.size_grid(&bbox, 100.0, Some((0, 4))).is_err());
        assert!(ResolutionSizer.size_grid(&bbox, 100.0, Some((10_000_000, 4))).is_err());
    }
}
