//! Tests for areas of interest and their bounding boxes.

use zonal_common::{AreaOfInterest, BoundingBox, Crs, ZonalError};

// ============================================================================
// Bounding box tests
// ============================================================================

#[test]
fn test_bbox_width_height() {
    let bbox = BoundingBox::new(-10.0, 0.0, 10.0, 5.0);
    assert_eq!(bbox.width(), 20.0);
    assert_eq!(bbox.height(), 5.0);
}

#[test]
fn test_bbox_expand() {
    let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).expand(0.5);
    assert_eq!(bbox, BoundingBox::new(-0.5, -0.5, 1.5, 1.5));
}

#[test]
fn test_bbox_from_single_point() {
    let bbox = BoundingBox::from_points([(2.0, 3.0)]).unwrap();
    assert_eq!(bbox.width(), 0.0);
    assert_eq!(bbox.height(), 0.0);
}

// ============================================================================
// Area of interest tests
// ============================================================================

#[test]
fn test_area_and_bbox_of_projected_square() {
    let area = AreaOfInterest::from_wkt(
        "POLYGON((250000 1600000, 254000 1600000, 254000 1604000, 250000 1604000, 250000 1600000))",
        Crs::ALASKA_ALBERS,
    )
    .unwrap();

    assert_eq!(area.area(), 16_000_000.0);
    assert_eq!(
        area.bbox(),
        Some(BoundingBox::new(250_000.0, 1_600_000.0, 254_000.0, 1_604_000.0))
    );
}

#[test]
fn test_hole_reduces_area() {
    let area = AreaOfInterest::from_wkt(
        "POLYGON((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 4 2, 4 4, 2 4, 2 2))",
        Crs::ALASKA_ALBERS,
    )
    .unwrap();
    assert_eq!(area.area(), 96.0);
    assert_eq!(area.geometry.0[0].interiors().len(), 1);
}

#[test]
fn test_geojson_and_wkt_agree() {
    let wkt = AreaOfInterest::from_wkt("POLYGON((0 0, 2 0, 2 1, 0 1, 0 0))", Crs::WGS84).unwrap();
    let geojson = AreaOfInterest::from_geojson(
        r#"{"type": "Polygon", "coordinates": [[[0, 0], [2, 0], [2, 1], [0, 1], [0, 0]]]}"#,
        Crs::WGS84,
    )
    .unwrap();
    assert_eq!(wkt, geojson);
}

#[test]
fn test_invalid_geojson_is_geometry_error() {
    let err = AreaOfInterest::from_geojson("{not json", Crs::WGS84).unwrap_err();
    assert!(matches!(err, ZonalError::InvalidGeometry(_)));
    assert_eq!(err.http_status_code(), 400);
}
