//! Nearest-neighbor upsampling of spatial layers.

use ndarray::{Array2, ArrayView2};

/// (row, col) of the source cell nearest to fractional position (x, y).
fn nearest_cell(width: usize, height: usize, x: f64, y: f64) -> Option<(usize, usize)> {
    if x < 0.0 || y < 0.0 {
        return None;
    }
    let col = x.round() as usize;
    let row = y.round() as usize;

    if col >= width || row >= height {
        return None;
    }

    Some((row, col))
}

/// Maps destination pixels of a resampled grid back to source cells.
///
/// Destination pixel `d` samples source position `d * (src - 1) / (dst - 1)`,
/// which keeps the first and last coordinates of both grids aligned.
#[derive(Debug, Clone, Copy)]
pub struct NearestSampler {
    src_width: usize,
    src_height: usize,
    scale_x: f64,
    scale_y: f64,
}

impl NearestSampler {
    pub fn new(src_width: usize, src_height: usize, dst_width: usize, dst_height: usize) -> Self {
        Self {
            src_width,
            src_height,
            scale_x: src_width.saturating_sub(1) as f64
                / dst_width.saturating_sub(1).max(1) as f64,
            scale_y: src_height.saturating_sub(1) as f64
                / dst_height.saturating_sub(1).max(1) as f64,
        }
    }

    /// Source (row, col) sampled by destination pixel (col, row).
    pub fn source_cell(&self, col: usize, row: usize) -> Option<(usize, usize)> {
        nearest_cell(
            self.src_width,
            self.src_height,
            col as f64 * self.scale_x,
            row as f64 * self.scale_y,
        )
    }
}

/// Resample a grid to a new size with nearest-neighbor sampling.
///
/// # Arguments
/// * `data` - Source grid, indexed (row, col)
/// * `dst_width` - Destination width
/// * `dst_height` - Destination height
///
/// # Returns
/// Resampled grid of shape (dst_height, dst_width)
pub fn resample_grid(
    data: ArrayView2<'_, f64>,
    dst_width: usize,
    dst_height: usize,
) -> Array2<f64> {
    let (src_height, src_width) = data.dim();
    let sampler = NearestSampler::new(src_width, src_height, dst_width, dst_height);

    Array2::from_shape_fn((dst_height, dst_width), |(row, col)| {
        sampler
            .source_cell(col, row)
            .map_or(f64::NAN, |cell| data[cell])
    })
}

/// Coordinates of an axis upsampled `factor` times, spanning the same first
/// and last coordinate (`linspace(first, last, n * factor)`).
///
/// A single-coordinate axis is subdivided across its cell using `spacing`.
pub fn upsample_coordinates(coordinates: &[f64], spacing: f64, factor: usize) -> Vec<f64> {
    let count = coordinates.len() * factor;
    match coordinates {
        [] => Vec::new(),
        [only] => {
            let step = spacing / factor as f64;
            let start = only - spacing / 2.0 + step / 2.0;
            (0..count).map(|i| start + i as f64 * step).collect()
        }
        [first, .., last] => {
            let step = (last - first) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { *last } else { first + i as f64 * step })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sampler_aligns_corners() {
        let sampler = NearestSampler::new(3, 3, 9, 9);
        assert_eq!(sampler.source_cell(0, 0), Some((0, 0)));
        assert_eq!(sampler.source_cell(8, 8), Some((2, 2)));
        // Destination 4 of 9 samples source 1.0, the middle cell
        assert_eq!(sampler.source_cell(4, 4), Some((1, 1)));
        assert_eq!(sampler.source_cell(1, 0), Some((0, 0)));
    }

    #[test]
    fn test_resample_replicates_cells() {
        let data = array![[1.0, 2.0], [3.0, 4.0]];
        let out = resample_grid(data.view(), 4, 4);
        assert_eq!(
            out,
            array![
                [1.0, 1.0, 2.0, 2.0],
                [1.0, 1.0, 2.0, 2.0],
                [3.0, 3.0, 4.0, 4.0],
                [3.0, 3.0, 4.0, 4.0],
            ]
        );
    }

    #[test]
    fn test_resample_keeps_nan() {
        let data = array![[f64::NAN, 1.0]];
        let out = resample_grid(data.view(), 4, 1);
        assert!(out[[0, 0]].is_nan() && out[[0, 1]].is_nan());
        assert_eq!(out[[0, 2]], 1.0);
        assert_eq!(out[[0, 3]], 1.0);
    }

    #[test]
    fn test_upsample_coordinates_linspace() {
        let coords = upsample_coordinates(&[0.0, 3.0], 3.0, 2);
        assert_eq!(coords, vec![0.0, 1.0, 2.0, 3.0]);

        let descending = upsample_coordinates(&[10.0, 8.0, 6.0], -2.0, 3);
        assert_eq!(descending.len(), 9);
        assert_eq!(descending[0], 10.0);
        assert_eq!(descending[8], 6.0);
        assert!(descending.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_upsample_single_coordinate() {
        let coords = upsample_coordinates(&[5.0], 2.0, 4);
        assert_eq!(coords, vec![4.25, 4.75, 5.25, 5.75]);
    }
}
