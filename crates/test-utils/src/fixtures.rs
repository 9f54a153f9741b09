//! Common test fixtures.

/// Bounding boxes as `(min_lat, max_lat, min_lon, max_lon)`.
pub mod bbox {
    /// Denver metro area.
    pub const DENVER: (f64, f64, f64, f64) = (39.544, 39.989, -105.264, -104.636);

    /// Denver metro area as written in corner-form layer configs.
    pub const DENVER_CORNERS_YAML: &str = "bbox:
  bottom_right_lat: 39.54462
  top_left_lat: 39.98894
  top_left_lon: -105.26372
  bottom_right_lon: -104.63632
";

    /// One-degree square at the origin.
    pub const UNIT: (f64, f64, f64, f64) = (0.0, 1.0, 0.0, 1.0);
}

/// Time interval fixtures.
pub mod intervals {
    /// Aug 7 – Sep 7 of 2012 and 2013, opening mid-afternoon.
    pub const SUMMERS: [[&str; 2]; 2] = [
        ["2012-08-07T14:10:30Z", "2012-09-07T14:10:30Z"],
        ["2013-08-07T14:10:30Z", "2013-09-07T14:10:30Z"],
    ];
}

/// Bucket durations, ISO 8601.
pub mod durations {
    pub const ONE_MINUTE: &str = "PT1M";
    pub const FIVE_MINUTES: &str = "PT5M";
    pub const TEN_MINUTES: &str = "PT10M";
    pub const FIFTEEN_MINUTES: &str = "PT15M";
    pub const THIRTY_MINUTES: &str = "PT30M";
    pub const ONE_DAY: &str = "P1D";
    pub const SEVEN_DAYS: &str = "P7D";
    pub const ONE_WEEK: &str = "P1W";
}
