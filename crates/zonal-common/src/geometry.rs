//! Polygonal areas of interest.
//!
//! An [`AreaOfInterest`] is the polygon a zonal statistic is computed over,
//! tagged with the CRS its coordinates are expressed in. Polygons arrive
//! either as GeoJSON (boundary services, uploads) or as WKT (query
//! parameters).

use geo::{Area, BoundingRect};
use geo_types::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use geojson::GeoJson;

use crate::{BoundingBox, Crs, ZonalError, ZonalResult};

/// A (multi)polygon plus the CRS of its coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaOfInterest {
    pub geometry: MultiPolygon<f64>,
    pub crs: Crs,
}

impl AreaOfInterest {
    pub fn new(geometry: MultiPolygon<f64>, crs: Crs) -> Self {
        Self { geometry, crs }
    }

    pub fn from_polygon(polygon: Polygon<f64>, crs: Crs) -> Self {
        Self::new(MultiPolygon(vec![polygon]), crs)
    }

    /// Axis-aligned rectangle as a polygon.
    pub fn from_bbox(bbox: &BoundingBox, crs: Crs) -> Self {
        let ring = vec![
            (bbox.min_x, bbox.min_y),
            (bbox.max_x, bbox.min_y),
            (bbox.max_x, bbox.max_y),
            (bbox.min_x, bbox.max_y),
            (bbox.min_x, bbox.min_y),
        ];
        Self::from_polygon(Polygon::new(LineString::from(ring), vec![]), crs)
    }

    /// Parse a GeoJSON document.
    ///
    /// Accepts a bare geometry, a feature, or a feature collection (the first
    /// feature with polygonal geometry is used).
    pub fn from_geojson(text: &str, crs: Crs) -> ZonalResult<Self> {
        let geojson: GeoJson = text
            .parse()
            .map_err(|e| ZonalError::invalid_geometry(format!("Invalid GeoJSON: {}", e)))?;

        let geometry = match geojson {
            GeoJson::Geometry(geometry) => geometry,
            GeoJson::Feature(feature) => feature
                .geometry
                .ok_or_else(|| ZonalError::invalid_geometry("Feature has no geometry"))?,
            GeoJson::FeatureCollection(collection) => collection
                .features
                .into_iter()
                .filter_map(|feature| feature.geometry)
                .find(|geometry| {
                    matches!(
                        geometry.value,
                        geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_)
                    )
                })
                .ok_or_else(|| {
                    ZonalError::invalid_geometry("FeatureCollection has no polygon feature")
                })?,
        };

        let geometry = Geometry::<f64>::try_from(geometry)
            .map_err(|e| ZonalError::invalid_geometry(format!("Unsupported geometry: {}", e)))?;

        let multi = match geometry {
            Geometry::Polygon(polygon) => MultiPolygon(vec![polygon]),
            Geometry::MultiPolygon(multi) => multi,
            _ => {
                return Err(ZonalError::invalid_geometry(
                    "Expected Polygon or MultiPolygon geometry",
                ))
            }
        };

        Self::validated(multi, crs)
    }

    /// Parse a WKT POLYGON or MULTIPOLYGON string.
    ///
    /// Accepts formats:
    /// - `POLYGON((x1 y1, x2 y2, x3 y3, x1 y1))`
    /// - `POLYGON((outer ring), (hole))`
    /// - `MULTIPOLYGON(((ring1)),((ring2)))`
    pub fn from_wkt(wkt: &str, crs: Crs) -> ZonalResult<Self> {
        let wkt = wkt.trim();
        let upper = wkt.to_uppercase();

        let body = if let Some(rest) = upper.strip_prefix("MULTIPOLYGON") {
            let offset = wkt.len() - rest.len();
            let inner = strip_parens(&wkt[offset..])?;
            split_top_level(inner)
                .into_iter()
                .map(parse_polygon_body)
                .collect::<ZonalResult<Vec<_>>>()?
        } else if let Some(rest) = upper.strip_prefix("POLYGON") {
            let offset = wkt.len() - rest.len();
            vec![parse_polygon_body(&wkt[offset..])?]
        } else {
            return Err(ZonalError::invalid_geometry(
                "Expected POLYGON or MULTIPOLYGON format",
            ));
        };

        Self::validated(MultiPolygon(body), crs)
    }

    fn validated(geometry: MultiPolygon<f64>, crs: Crs) -> ZonalResult<Self> {
        if geometry.0.is_empty() {
            return Err(ZonalError::invalid_geometry("Geometry has no polygons"));
        }
        for polygon in &geometry {
            if polygon.exterior().0.len() < 4 {
                return Err(ZonalError::invalid_geometry(
                    "Polygon must have at least 4 points (including closing point)",
                ));
            }
            let all_finite = polygon
                .exterior()
                .coords()
                .chain(polygon.interiors().iter().flat_map(|ring| ring.coords()))
                .all(|c| c.x.is_finite() && c.y.is_finite());
            if !all_finite {
                return Err(ZonalError::invalid_geometry("Polygon has non-finite coordinates"));
            }
        }
        Ok(Self { geometry, crs })
    }

    /// Planar area in squared CRS units.
    pub fn area(&self) -> f64 {
        self.geometry.unsigned_area()
    }

    /// Bounding box of all polygons.
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.geometry
            .bounding_rect()
            .map(|rect| BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}

/// Remove one level of enclosing parentheses.
fn strip_parens(s: &str) -> ZonalResult<&str> {
    let s = s.trim();
    let start = s
        .find('(')
        .ok_or_else(|| ZonalError::invalid_geometry("Missing opening parenthesis"))?;
    let end = s
        .rfind(')')
        .ok_or_else(|| ZonalError::invalid_geometry("Missing closing parenthesis"))?;
    if end <= start {
        return Err(ZonalError::invalid_geometry("Invalid parenthesis order"));
    }
    Ok(&s[start + 1..end])
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = s[start..].trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts
}

/// Parse `((outer), (hole), ...)` into a polygon.
fn parse_polygon_body(s: &str) -> ZonalResult<Polygon<f64>> {
    let inner = strip_parens(s)?;
    let mut rings = split_top_level(inner)
        .into_iter()
        .map(|ring| strip_parens(ring).and_then(parse_ring))
        .collect::<ZonalResult<Vec<_>>>()?;

    if rings.is_empty() {
        return Err(ZonalError::invalid_geometry("Polygon has no rings"));
    }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

/// Parse a single ring from a coordinate string.
fn parse_ring(coords: &str) -> ZonalResult<LineString<f64>> {
    let points = coords
        .split(',')
        .map(|pair| {
            let pair = pair.trim();
            let parts: Vec<&str> = pair.split_whitespace().collect();
            if parts.len() != 2 {
                return Err(ZonalError::invalid_geometry(format!(
                    "Expected 'x y' format, got '{}'",
                    pair
                )));
            }
            let x: f64 = parts[0].parse().map_err(|_| {
                ZonalError::invalid_geometry(format!("Invalid coordinate: {}", parts[0]))
            })?;
            let y: f64 = parts[1].parse().map_err(|_| {
                ZonalError::invalid_geometry(format!("Invalid coordinate: {}", parts[1]))
            })?;
            Ok(Coord { x, y })
        })
        .collect::<ZonalResult<Vec<_>>>()?;

    Ok(LineString::from(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wkt_polygon() {
        let aoi =
            AreaOfInterest::from_wkt("POLYGON((0 0, 4 0, 4 2, 0 2, 0 0))", Crs::ALASKA_ALBERS)
                .unwrap();
        assert_eq!(aoi.geometry.0.len(), 1);
        assert!((aoi.area() - 8.0).abs() < 1e-12);
        assert_eq!(aoi.bbox(), Some(BoundingBox::new(0.0, 0.0, 4.0, 2.0)));
    }

    #[test]
    fn test_parse_wkt_polygon_with_hole() {
        let aoi = AreaOfInterest::from_wkt(
            "POLYGON((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 4 2, 4 4, 2 4, 2 2))",
            Crs::ALASKA_ALBERS,
        )
        .unwrap();
        assert_eq!(aoi.geometry.0[0].interiors().len(), 1);
        assert!((aoi.area() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_wkt_multipolygon() {
        let aoi = AreaOfInterest::from_wkt(
            "MULTIPOLYGON(((0 0, 1 0, 1 1, 0 1, 0 0)),((5 5, 7 5, 7 7, 5 7, 5 5)))",
            Crs::ALASKA_ALBERS,
        )
        .unwrap();
        assert_eq!(aoi.geometry.0.len(), 2);
        assert!((aoi.area() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_wkt_rejects_point() {
        let err = AreaOfInterest::from_wkt("POINT(1 2)", Crs::WGS84).unwrap_err();
        assert!(matches!(err, ZonalError::InvalidGeometry(_)));
    }

    #[test]
    fn test_parse_wkt_too_few_points() {
        let err = AreaOfInterest::from_wkt("POLYGON((0 0, 1 1, 0 0))", Crs::WGS84).unwrap_err();
        assert!(matches!(err, ZonalError::InvalidGeometry(_)));
    }

    #[test]
    fn test_parse_geojson_feature() {
        let text = r#"{
            "type": "Feature",
            "properties": {"name": "test"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]]
            }
        }"#;
        let aoi = AreaOfInterest::from_geojson(text, Crs::ALASKA_ALBERS).unwrap();
        assert!((aoi.area() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_geojson_collection_skips_points() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [1.0, 1.0]}},
                {"type": "Feature", "properties": {}, "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]]
                }}
            ]
        }"#;
        let aoi = AreaOfInterest::from_geojson(text, Crs::WGS84).unwrap();
        assert_eq!(aoi.geometry.0.len(), 1);
    }

    #[test]
    fn test_from_bbox() {
        let aoi = AreaOfInterest::from_bbox(&BoundingBox::new(0.0, 0.0, 3.0, 3.0), Crs::WGS84);
        assert!((aoi.area() - 9.0).abs() < 1e-12);
    }
}
