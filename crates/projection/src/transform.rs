//! Point, box and polygon reprojection.

use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use proj4rs::proj::Proj;
use tracing::debug;
use zonal_common::{AreaOfInterest, BoundingBox, Crs};

use crate::error::ProjectionError;

/// Points sampled along each bbox edge when reprojecting a box.
const BBOX_EDGE_SAMPLES: usize = 21;

/// Get the PROJ4 string for an EPSG code from the crs-definitions database.
fn proj_string(crs: Crs) -> Option<&'static str> {
    crs_definitions::from_code(crs.epsg()).map(|def| def.proj4)
}

/// Check if a CRS is geographic (lon/lat in degrees).
///
/// Codes missing from the database fall back to the 4000-4999 EPSG range.
pub fn is_geographic(crs: Crs) -> bool {
    match proj_string(crs) {
        Some(proj) => proj.contains("+proj=longlat"),
        None => (4000..5000).contains(&crs.epsg()),
    }
}

/// A prepared transform between two coordinate systems.
///
/// Parses both projection definitions once so that transforming many
/// vertices does not re-parse PROJ strings.
pub struct Reprojector {
    source: Crs,
    target: Crs,
    projs: Option<(Proj, Proj)>,
    source_geographic: bool,
    target_geographic: bool,
}

impl Reprojector {
    pub fn new(source: Crs, target: Crs) -> Result<Self, ProjectionError> {
        let source_geographic = is_geographic(source);
        let target_geographic = is_geographic(target);

        // Identity: no definitions needed
        if source == target {
            return Ok(Self {
                source,
                target,
                projs: None,
                source_geographic,
                target_geographic,
            });
        }

        let source_proj = load_proj(source)?;
        let target_proj = load_proj(target)?;

        Ok(Self {
            source,
            target,
            projs: Some((source_proj, target_proj)),
            source_geographic,
            target_geographic,
        })
    }

    pub fn source(&self) -> Crs {
        self.source
    }

    pub fn target(&self) -> Crs {
        self.target
    }

    pub fn is_identity(&self) -> bool {
        self.projs.is_none()
    }

    /// Transform a single point.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let Some((source_proj, target_proj)) = &self.projs else {
            return Ok((x, y));
        };

        // proj4rs uses radians for geographic coordinates
        let (x_in, y_in) = if self.source_geographic {
            (x.to_radians(), y.to_radians())
        } else {
            (x, y)
        };

        let mut point = (x_in, y_in, 0.0);
        proj4rs::transform::transform(source_proj, target_proj, &mut point).map_err(|e| {
            ProjectionError::TransformFailed {
                from: self.source.epsg(),
                to: self.target.epsg(),
                message: format!("{:?}", e),
            }
        })?;

        let (out_x, out_y) = if self.target_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !out_x.is_finite() || !out_y.is_finite() {
            return Err(ProjectionError::TransformFailed {
                from: self.source.epsg(),
                to: self.target.epsg(),
                message: format!("({}, {}) has no finite image", x, y),
            });
        }

        Ok((out_x, out_y))
    }

    fn transform_ring(&self, ring: &LineString<f64>) -> Result<LineString<f64>, ProjectionError> {
        ring.coords()
            .map(|c| self.transform(c.x, c.y).map(|(x, y)| Coord { x, y }))
            .collect::<Result<Vec<_>, _>>()
            .map(LineString::from)
    }

    /// Transform every vertex of a multipolygon.
    pub fn transform_multipolygon(
        &self,
        geometry: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, ProjectionError> {
        geometry
            .iter()
            .map(|polygon| {
                let exterior = self.transform_ring(polygon.exterior())?;
                let interiors = polygon
                    .interiors()
                    .iter()
                    .map(|ring| self.transform_ring(ring))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Polygon::new(exterior, interiors))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(MultiPolygon)
    }
}

fn load_proj(crs: Crs) -> Result<Proj, ProjectionError> {
    let definition = proj_string(crs).ok_or(ProjectionError::UnknownCrs(crs.epsg()))?;
    Proj::from_proj_string(definition).map_err(|e| ProjectionError::InvalidDefinition {
        epsg: crs.epsg(),
        message: format!("{:?}", e),
    })
}

/// Project a point from one CRS to another.
pub fn project_point(
    source: Crs,
    target: Crs,
    x: f64,
    y: f64,
) -> Result<(f64, f64), ProjectionError> {
    Reprojector::new(source, target)?.transform(x, y)
}

/// Reproject an area of interest into `target`.
pub fn reproject_area(
    area: &AreaOfInterest,
    target: Crs,
) -> Result<AreaOfInterest, ProjectionError> {
    if area.crs == target {
        return Ok(area.clone());
    }
    let reprojector = Reprojector::new(area.crs, target)?;
    let geometry = reprojector.transform_multipolygon(&area.geometry)?;
    debug!(
        from = %area.crs,
        to = %target,
        polygons = geometry.0.len(),
        "Reprojected area of interest"
    );
    Ok(AreaOfInterest::new(geometry, target))
}

/// Reproject a bounding box, sampling points along every edge so that
/// curved edges in the target CRS are enclosed.
pub fn reproject_bbox(
    bbox: &BoundingBox,
    source: Crs,
    target: Crs,
) -> Result<BoundingBox, ProjectionError> {
    let reprojector = Reprojector::new(source, target)?;
    if reprojector.is_identity() {
        return Ok(*bbox);
    }

    let mut points = Vec::with_capacity(BBOX_EDGE_SAMPLES * 4);
    for i in 0..BBOX_EDGE_SAMPLES {
        let t = i as f64 / (BBOX_EDGE_SAMPLES - 1) as f64;
        let x = bbox.min_x + t * bbox.width();
        let y = bbox.min_y + t * bbox.height();
        points.push(reprojector.transform(x, bbox.min_y)?);
        points.push(reprojector.transform(x, bbox.max_y)?);
        points.push(reprojector.transform(bbox.min_x, y)?);
        points.push(reprojector.transform(bbox.max_x, y)?);
    }

    BoundingBox::from_points(points).ok_or(ProjectionError::TransformFailed {
        from: source.epsg(),
        to: target.epsg(),
        message: "empty bounding box".to_string(),
    })
}
