//! Polygon rasterization onto a grid of pixel centers.

use geo_types::LineString;
use zonal_common::{AreaOfInterest, ZonalError, ZonalResult};

/// Affine mapping from pixel (col, row) to the coordinates of its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelTransform {
    /// Center of pixel (0, 0).
    pub origin_x: f64,
    pub origin_y: f64,
    /// Signed step per column / row.
    pub step_x: f64,
    pub step_y: f64,
}

impl PixelTransform {
    /// Derive the transform from pixel-center coordinates, as produced by
    /// upsampling. Single coordinates fall back to the given steps.
    pub fn from_coordinates(
        xs: &[f64],
        ys: &[f64],
        fallback: (f64, f64),
    ) -> ZonalResult<Self> {
        let step = |coords: &[f64], fallback: f64| match coords {
            [first, .., last] if coords.len() > 1 => (last - first) / (coords.len() - 1) as f64,
            _ => fallback,
        };
        let (Some(&origin_x), Some(&origin_y)) = (xs.first(), ys.first()) else {
            return Err(ZonalError::invalid_grid("Cannot rasterize onto an empty grid"));
        };

        let transform = Self {
            origin_x,
            origin_y,
            step_x: step(xs, fallback.0),
            step_y: step(ys, fallback.1),
        };
        let usable = |step: f64| step != 0.0 && step.is_finite();
        if !usable(transform.step_x) || !usable(transform.step_y) {
            return Err(ZonalError::invalid_grid("Degenerate pixel size"));
        }
        Ok(transform)
    }

    /// Fractional (col, row) of a coordinate.
    fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.origin_x) / self.step_x, (y - self.origin_y) / self.step_y)
    }
}

/// A 0/1 raster of the pixels whose centers fall inside a polygon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Mask {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn contains(&self, col: usize, row: usize) -> bool {
        self.cells[row * self.width + col]
    }

    /// Number of pixels inside the polygon.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&inside| inside).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// (col, row) of every pixel inside, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &inside)| inside)
            .map(move |(i, _)| (i % self.width, i / self.width))
    }
}

/// Rasterize an area onto a `width` by `height` grid.
///
/// A pixel is inside when its center is inside some polygon of the area.
/// Within one polygon the even-odd rule applies across its rings, so holes
/// are excluded; overlapping polygons burn their union.
pub fn rasterize(
    area: &AreaOfInterest,
    transform: &PixelTransform,
    width: usize,
    height: usize,
) -> Mask {
    let polygons: Vec<Vec<Vec<(f64, f64)>>> = area
        .geometry
        .iter()
        .map(|polygon| {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| pixel_ring(ring, transform))
                .collect()
        })
        .collect();

    let mut cells = vec![false; width * height];
    let mut crossings: Vec<f64> = Vec::new();

    for row in 0..height {
        let y = row as f64;

        for rings in &polygons {
            crossings.clear();
            for edge in rings.iter().flat_map(|ring| ring.windows(2)) {
                let ((x1, y1), (x2, y2)) = (edge[0], edge[1]);
                if (y1 > y) != (y2 > y) {
                    crossings.push(x1 + (y - y1) * (x2 - x1) / (y2 - y1));
                }
            }

            // Spans between sorted crossing pairs are disjoint
            crossings.sort_by(f64::total_cmp);
            for pair in crossings.chunks_exact(2) {
                let start = pair[0].ceil().max(0.0);
                let end = pair[1].ceil().min(width as f64);
                if end <= start {
                    continue;
                }
                for col in start as usize..end as usize {
                    cells[row * width + col] = true;
                }
            }
        }
    }

    Mask {
        width,
        height,
        cells,
    }
}

/// Ring vertices in fractional pixel coordinates, explicitly closed.
fn pixel_ring(ring: &LineString<f64>, transform: &PixelTransform) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = ring
        .coords()
        .map(|c| transform.to_pixel(c.x, c.y))
        .collect();
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if first != last {
            points.push(first);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonal_common::Crs;

    fn unit_transform() -> PixelTransform {
        // Pixel centers at 0.5, 1.5, ... ascending x; y descending from 9.5
        PixelTransform {
            origin_x: 0.5,
            origin_y: 9.5,
            step_x: 1.0,
            step_y: -1.0,
        }
    }

    #[test]
    fn test_square_covers_centers() {
        let area =
            AreaOfInterest::from_wkt("POLYGON((2 2, 5 2, 5 4, 2 4, 2 2))", Crs::ALASKA_ALBERS)
                .unwrap();
        let mask = rasterize(&area, &unit_transform(), 10, 10);
        assert_eq!(mask.count(), 6);
        // Center (2.5, 3.5) is col 2, row 6
        assert!(mask.contains(2, 6));
        assert!(mask.contains(4, 7));
        assert!(!mask.contains(5, 7));
        assert!(!mask.contains(2, 5));
    }

    #[test]
    fn test_hole_is_excluded() {
        let area = AreaOfInterest::from_wkt(
            "POLYGON((0 0, 10 0, 10 10, 0 10, 0 0), (4 4, 6 4, 6 6, 4 6, 4 4))",
            Crs::ALASKA_ALBERS,
        )
        .unwrap();
        let mask = rasterize(&area, &unit_transform(), 10, 10);
        assert_eq!(mask.count(), 96);
        assert!(!mask.contains(4, 4));
    }

    #[test]
    fn test_overlapping_polygons_burn_union() {
        let area = AreaOfInterest::from_wkt(
            "MULTIPOLYGON(((2 2, 5 2, 5 4, 2 4, 2 2)),((4 2, 7 2, 7 4, 4 4, 4 2)))",
            Crs::ALASKA_ALBERS,
        )
        .unwrap();
        let mask = rasterize(&area, &unit_transform(), 10, 10);
        assert_eq!(mask.count(), 10);
        // Center (4.5, 2.5) lies in both squares
        assert!(mask.contains(4, 7));
        assert!(mask.contains(4, 6));
    }

    #[test]
    fn test_small_polygon_between_centers_is_empty() {
        let area = AreaOfInterest::from_wkt(
            "POLYGON((2.6 2.6, 2.9 2.6, 2.9 2.9, 2.6 2.9, 2.6 2.6))",
            Crs::ALASKA_ALBERS,
        )
        .unwrap();
        let mask = rasterize(&area, &unit_transform(), 10, 10);
        assert!(mask.is_empty());
    }

    #[test]
    fn test_outside_polygon_is_empty() {
        let area = AreaOfInterest::from_wkt(
            "POLYGON((20 20, 30 20, 30 30, 20 30, 20 20))",
            Crs::ALASKA_ALBERS,
        )
        .unwrap();
        let mask = rasterize(&area, &unit_transform(), 10, 10);
        assert_eq!(mask.shape(), (10, 10));
        assert_eq!(mask.pixels().count(), 0);
    }

    #[test]
    fn test_transform_from_coordinates() {
        let t = PixelTransform::from_coordinates(&[0.5, 1.5, 2.5], &[9.5, 8.5], (1.0, -1.0))
            .unwrap();
        assert_eq!(t, unit_transform());
        assert!(PixelTransform::from_coordinates(&[], &[1.0], (1.0, 1.0)).is_err());
    }
}
