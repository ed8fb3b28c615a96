//! Upsampling factor for polygons small relative to a grid cell.
//!
//! The factor follows a hyperbola in the ratio `r = polygon_area /
//! cell_area`: `ceil((M*r + B) / (r - C) + H)`. Small polygons get up to
//! ~16x upsampling, large ones approach 1.

use zonal_common::{ZonalError, ZonalResult};

const M: f64 = 0.0;
const B: f64 = 350.0;
const C: f64 = -24.0;
const H: f64 = 1.0;

/// Integer upsampling multiplier for a polygon of `polygon_area` over cells
/// of `cell_area`, both in the same squared units.
pub fn scale_factor(polygon_area: f64, cell_area: f64) -> ZonalResult<usize> {
    if !(cell_area.is_finite() && cell_area > 0.0) {
        return Err(ZonalError::invalid_grid(format!(
            "Grid cell area must be positive, got {}",
            cell_area
        )));
    }
    if !(polygon_area.is_finite() && polygon_area >= 0.0) {
        return Err(ZonalError::invalid_geometry(format!(
            "Polygon area must be finite and non-negative, got {}",
            polygon_area
        )));
    }

    let ratio = polygon_area / cell_area;
    let factor = ((M * ratio + B) / (ratio - C) + H).ceil();
    Ok(factor.max(1.0) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiny_polygon() {
        assert_eq!(scale_factor(0.0001, 1.0).unwrap(), 16);
        assert_eq!(scale_factor(0.0, 1.0).unwrap(), 16);
    }

    #[test]
    fn test_large_polygon() {
        assert_eq!(scale_factor(100.0, 1.0).unwrap(), 4);
        assert_eq!(scale_factor(1.0e6, 1.0).unwrap(), 2);
        assert_eq!(scale_factor(1.0e20, 1.0).unwrap(), 1);
    }

    #[test]
    fn test_units_cancel() {
        // 2 km cells, 10 km^2 polygon: ratio 2.5
        assert_eq!(
            scale_factor(10.0e6, 4.0e6).unwrap(),
            scale_factor(2.5, 1.0).unwrap()
        );
    }

    #[test]
    fn test_monotone_non_increasing() {
        let mut previous = usize::MAX;
        let mut ratio = 1.0e-6;
        while ratio < 1.0e12 {
            let factor = scale_factor(ratio, 1.0).unwrap();
            assert!(factor >= 1);
            assert!(factor <= previous, "factor rose at ratio {}", ratio);
            previous = factor;
            ratio *= 1.7;
        }
    }

    #[test]
    fn test_invalid_cell_area() {
        assert!(matches!(scale_factor(1.0, 0.0), Err(ZonalError::InvalidGrid(_))));
        assert!(matches!(scale_factor(1.0, -2.0), Err(ZonalError::InvalidGrid(_))));
        assert!(matches!(scale_factor(1.0, f64::NAN), Err(ZonalError::InvalidGrid(_))));
    }
}
