//! Mapping of point coordinates onto linear grid cells.
//!
//! Both axes are binned independently and then combined into a row-major
//! linear index, so the spatial reduction is a single 1D histogram:
//!
//! ```text
//! relative = floor((value - start) / step)
//! mask     = 0 <= relative < size
//! index    = lat_index * x_size + lon_index     (masked points only)
//! ```
//!
//! Non-finite coordinates never satisfy the mask and are dropped before
//! linearization.

use grid_common::GridGeometry;

/// Per-axis bin coordinates plus an in-bounds mask.
///
/// `index` is clamped to `[0, size - 1]` even where `mask` is false; callers
/// must apply the mask before trusting it.
pub fn clip_index(values: &[f64], start: f64, size: usize, step: f64) -> (Vec<usize>, Vec<bool>) {
    let upper = size.saturating_sub(1) as f64;
    let mut index = Vec::with_capacity(values.len());
    let mut mask = Vec::with_capacity(values.len());

    for &value in values {
        let relative = ((value - start) / step).floor();
        mask.push(relative >= 0.0 && relative < size as f64);
        // NaN casts to 0, infinities are clamped.
        index.push(relative.clamp(0.0, upper) as usize);
    }

    (index, mask)
}

/// Result of binning one batch of points into a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct BinCounts {
    /// Linear cell index of every in-bounds point, in input order.
    pub index: Vec<usize>,
    /// Total number of cells (`x_size * y_size`).
    pub area: usize,
    /// Number of points per cell, length `area`.
    pub counts: Vec<u64>,
    /// Per input point: whether it fell inside the grid.
    pub mask: Vec<bool>,
}

impl BinCounts {
    /// Number of points that landed inside the grid.
    pub fn in_bounds(&self) -> usize {
        self.index.len()
    }

    /// Keep only the entries of `values` whose point is in bounds.
    ///
    /// The result is aligned with `index`.
    pub fn select<T: Copy>(&self, values: &[T]) -> Vec<T> {
        values
            .iter()
            .zip(&self.mask)
            .filter_map(|(value, &keep)| keep.then_some(*value))
            .collect()
    }
}

/// Bin longitude/latitude pairs into the grid and count points per cell.
///
/// `lat` must already be in the grid's latitude space (projected when the
/// grid origin was projected).
pub fn bin_count(grid: &GridGeometry, lon: &[f64], lat: &[f64]) -> BinCounts {
    debug_assert_eq!(lon.len(), lat.len(), "coordinate arrays differ in length");

    let (lon_index, lon_mask) = clip_index(lon, grid.min_lon, grid.x_size, grid.step);
    let (lat_index, lat_mask) = clip_index(lat, grid.min_lat, grid.y_size, grid.step);

    let area = grid.area();
    let mut counts = vec![0u64; area];
    let mut index = Vec::with_capacity(lon_index.len());
    let mut mask = Vec::with_capacity(lon_index.len());

    for (((&i, &j), &lon_in), &lat_in) in lon_index
        .iter()
        .zip(&lat_index)
        .zip(&lon_mask)
        .zip(&lat_mask)
    {
        let inside = lon_in && lat_in;
        mask.push(inside);
        if inside {
            let cell = grid.flat_index(i, j);
            counts[cell] += 1;
            index.push(cell);
        }
    }

    BinCounts {
        index,
        area,
        counts,
        mask,
    }
}
