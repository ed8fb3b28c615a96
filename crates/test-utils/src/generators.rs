//! Test data generators for synthetic coverages.
//!
//! These generators create predictable, verifiable values and the JSON
//! documents (coverage descriptions, grid slices) the engine consumes.

use serde_json::{json, Value};

use crate::fixtures::GridSpec;

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Returns
///
/// A `Vec<f64>` in row-major order (row 0 first, then row 1, etc.)
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);   // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f64);
        }
    }
    data
}

/// Creates a grid with NaN values at specified (col, row) positions and a
/// constant elsewhere.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    value: f64,
    nan_positions: &[(usize, usize)],
) -> Vec<f64> {
    let mut data = vec![value; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f64::NAN;
        }
    }
    data
}

/// Stacks `layers` spatial grids into one row-major array.
///
/// `value(layer, col, row)` fills each cell. Layers are numbered in the
/// order their combinations are enumerated (first axis slowest).
pub fn create_layered_values(
    layers: usize,
    width: usize,
    height: usize,
    value: impl Fn(usize, usize, usize) -> f64,
) -> Vec<f64> {
    let mut data = Vec::with_capacity(layers * width * height);
    for layer in 0..layers {
        for row in 0..height {
            for col in 0..width {
                data.push(value(layer, col, row));
            }
        }
    }
    data
}

/// Builds a describe-coverage document.
///
/// `encoded` lists the non-spatial axes in declared order with their
/// labels; label `i` is encoded as coordinate `i`. The encoding table is
/// embedded as a single-quoted string, as the upstream server writes it.
pub fn description_document(
    coverage_id: &str,
    encoded: &[(&str, &[&str])],
    spec: &GridSpec,
    crs: &str,
) -> Value {
    let mut axes: Vec<Value> = encoded
        .iter()
        .map(|(name, labels)| {
            json!({
                "type": "IrregularAxis",
                "axisLabel": name,
                "uomLabel": "",
                "lowerBound": 0,
                "upperBound": labels.len().saturating_sub(1),
                "coordinate": (0..labels.len()).map(|i| i.to_string()).collect::<Vec<_>>(),
            })
        })
        .collect();

    let (min_x, min_y, max_x, max_y) = spec.bbox();
    axes.push(json!({
        "type": "RegularAxis", "axisLabel": "X", "uomLabel": "metre",
        "lowerBound": min_x, "upperBound": max_x, "resolution": spec.cell,
    }));
    axes.push(json!({
        "type": "RegularAxis", "axisLabel": "Y", "uomLabel": "metre",
        "lowerBound": min_y, "upperBound": max_y, "resolution": -spec.cell,
    }));

    json!({
        "id": coverage_id,
        "type": "CoverageByDomainAndRange",
        "domainSet": {
            "type": "DomainSet",
            "generalGrid": {
                "type": "GeneralGridCoverage",
                "srsName": crs,
                "axisLabels": encoded.iter().map(|(n, _)| *n).chain(["X", "Y"]).collect::<Vec<_>>(),
                "axis": axes,
            }
        },
        "metadata": {
            "Encoding": python_literal_table(encoded),
        }
    })
}

/// `{'axis': {'0': 'label', ...}, ...}`
pub fn python_literal_table(encoded: &[(&str, &[&str])]) -> String {
    let axes: Vec<String> = encoded
        .iter()
        .map(|(name, labels)| {
            let entries: Vec<String> = labels
                .iter()
                .enumerate()
                .map(|(i, label)| format!("'{}': '{}'", i, label))
                .collect();
            format!("'{}': {{{}}}", name, entries.join(", "))
        })
        .collect();
    format!("{{{}}}", axes.join(", "))
}

/// Builds a grid slice document with axes ordered
/// `[non-spatial..., Y, X]` and integer codes `0..n` on each non-spatial
/// axis. NaN values are written as null.
pub fn grid_document(
    crs: &str,
    non_spatial: &[(&str, usize)],
    spec: &GridSpec,
    values: &[f64],
) -> Value {
    let mut axes: Vec<Value> = non_spatial
        .iter()
        .map(|(name, len)| json!({"name": name, "coordinates": (0..*len).collect::<Vec<_>>()}))
        .collect();
    axes.push(json!({"name": "Y", "coordinates": spec.y_coords()}));
    axes.push(json!({"name": "X", "coordinates": spec.x_coords()}));

    let values: Vec<Value> = values
        .iter()
        .map(|v| if v.is_nan() { Value::Null } else { json!(v) })
        .collect();

    json!({"crs": crs, "axes": axes, "values": values})
}

/// A closed axis-aligned square as WKT.
pub fn square_wkt(min_x: f64, min_y: f64, size: f64) -> String {
    let (max_x, max_y) = (min_x + size, min_y + size);
    format!(
        "POLYGON(({min_x} {min_y}, {max_x} {min_y}, {max_x} {max_y}, {min_x} {max_y}, {min_x} {min_y}))"
    )
}

/// A closed axis-aligned square as a GeoJSON feature.
pub fn square_geojson(min_x: f64, min_y: f64, size: f64) -> String {
    let (max_x, max_y) = (min_x + size, min_y + size);
    json!({
        "type": "Feature",
        "properties": {},
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y], [min_x, min_y]]]
        }
    })
    .to_string()
}
