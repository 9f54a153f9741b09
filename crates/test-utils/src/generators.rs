//! Synthetic data generators.
//!
//! These produce predictable timestamps and coordinates; tests wrap them
//! into records of whatever crate they exercise.

use chrono::{DateTime, Duration, TimeZone, Utc};

/// `count` timestamps starting at `start`, `spacing` apart.
pub fn uniform_timestamps(start: DateTime<Utc>, spacing: Duration, count: usize) -> Vec<DateTime<Utc>> {
    (0..count)
        .map(|i| start + spacing * i as i32)
        .collect()
}

/// Timestamps from 2012-01-01 at `spacing`.
///
/// Sub-daily spacings cover thirty days of minutes' worth of samples
/// (`60 * 24 * 30`); daily or longer spacings produce `7 * 50` samples.
pub fn month_timestamps(spacing: Duration) -> Vec<DateTime<Utc>> {
    let start = Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).single().unwrap_or_default();
    let count = if spacing < Duration::days(1) {
        60 * 24 * 30
    } else {
        7 * 50
    };
    uniform_timestamps(start, spacing, count)
}

/// Cell-center coordinates of an `nx` x `ny` lattice starting at
/// `(min_lon, min_lat)` with `step` spacing, row-major.
pub fn lattice_points(min_lon: f64, min_lat: f64, step: f64, nx: usize, ny: usize) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(nx * ny);
    for row in 0..ny {
        for col in 0..nx {
            points.push((
                min_lon + (col as f64 + 0.5) * step,
                min_lat + (row as f64 + 0.5) * step,
            ));
        }
    }
    points
}

/// Deterministic pseudo-random points inside a box, from a simple LCG.
pub fn scattered_points(
    (min_lon, max_lon): (f64, f64),
    (min_lat, max_lat): (f64, f64),
    count: usize,
    seed: u32,
) -> Vec<(f64, f64)> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let mut next = move || {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        f64::from(state >> 8) / f64::from(1u32 << 24)
    };
    (0..count)
        .map(|_| {
            let lon = min_lon + next() * (max_lon - min_lon);
            let lat = min_lat + next() * (max_lat - min_lat);
            (lon, lat)
        })
        .collect()
}
