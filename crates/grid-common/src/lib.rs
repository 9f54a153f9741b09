//! Common types shared across the point-volume workspace.

pub mod bbox;
pub mod error;
pub mod grid;
pub mod time;

pub use bbox::{BoundingBox, GeoBounds};
pub use error::{GridError, GridResult};
pub use grid::{GridGeometry, GridSizing};
pub use time::{
    floor_to_step, format_timestamp, parse_iso8601_duration, parse_timestamp, IsoDuration,
    TimeInterval, TimeZoneSpec,
};
