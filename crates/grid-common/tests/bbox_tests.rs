//! Tests for BoundingBox construction and deserialization.

use grid_common::bbox::BoundingBox;

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(39.544, 39.989, -105.264, -104.636).unwrap();
    assert_eq!(bbox.min_lat, 39.544);
    assert_eq!(bbox.max_lat, 39.989);
    assert_eq!(bbox.min_lon, -105.264);
    assert_eq!(bbox.max_lon, -104.636);
}

#[test]
fn test_bbox_rejects_nan() {
    assert!(BoundingBox::new(f64::NAN, 40.0, -105.0, -104.0).is_err());
    assert!(BoundingBox::new(39.0, 40.0, -105.0, f64::INFINITY).is_err());
}

#[test]
fn test_bbox_dimensions() {
    let bbox = BoundingBox::new(10.0, 12.5, 20.0, 24.0).unwrap();
    assert!((bbox.width() - 4.0).abs() < 1e-12);
    assert!((bbox.height() - 2.5).abs() < 1e-12);
}

#[test]
fn test_contains_point_edges_inclusive() {
    let bbox = BoundingBox::new(0.0, 10.0, 0.0, 10.0).unwrap();
    assert!(bbox.contains_point(0.0, 0.0));
    assert!(bbox.contains_point(10.0, 10.0));
    assert!(!bbox.contains_point(10.1, 5.0));
    assert!(!bbox.contains_point(f64::NAN, 5.0));
}

// ============================================================================
// Deserialization tests
// ============================================================================

#[test]
fn test_deserialize_min_max_form() {
    let json = r#"{"min_lat": 39.5, "max_lat": 40.0, "min_lon": -105.3, "max_lon": -104.6}"#;
    let bbox: BoundingBox = serde_json::from_str(json).unwrap();
    assert!(bbox.validate().is_ok());
    assert_eq!(bbox.max_lat, 40.0);
}

#[test]
fn test_deserialize_corner_form() {
    let json = r#"{
        "bottom_right_lat": 39.54462,
        "top_left_lat": 39.98894,
        "top_left_lon": -105.26372,
        "bottom_right_lon": -104.63632
    }"#;
    let bbox: BoundingBox = serde_json::from_str(json).unwrap();
    assert_eq!(bbox.min_lat, 39.54462);
    assert_eq!(bbox.max_lat, 39.98894);
    assert_eq!(bbox.min_lon, -105.26372);
    assert_eq!(bbox.max_lon, -104.63632);
    assert!(bbox.validate().is_ok());
}
