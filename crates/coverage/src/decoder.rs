//! Coverage description decoding.
//!
//! Turns the describe-coverage JSON of the upstream coverage server into a
//! [`CoverageDescriptor`]. Only the parts the engine uses are read: the
//! axis list, the CRS name, and the embedded encoding table.

use serde_json::{Map, Value};
use tracing::{debug, warn};
use zonal_common::{Crs, ZonalError, ZonalResult};

use crate::axis::{AxisCoordinates, AxisDescriptor, AxisKind, SpatialRole};
use crate::descriptor::CoverageDescriptor;
use crate::encoding::parse_encoding_table;

/// Decode a coverage description document.
///
/// Fails with `MetadataFormat` when the axis list is absent, when the x or
/// y axis cannot be identified, or when the encoding table is missing or
/// unparsable.
pub fn decode_description(coverage_id: &str, document: &Value) -> ZonalResult<CoverageDescriptor> {
    let root = document
        .as_object()
        .ok_or_else(|| ZonalError::metadata("Description is not a JSON object"))?;
    let grid = root
        .get("domainSet")
        .and_then(|d| d.get("generalGrid"))
        .and_then(Value::as_object);

    let raw_axes = grid
        .and_then(|g| g.get("axis"))
        .or_else(|| root.get("axis"))
        .and_then(Value::as_array)
        .ok_or_else(|| ZonalError::metadata("Description has no axis list"))?;

    let mut axes = raw_axes
        .iter()
        .map(parse_axis)
        .collect::<ZonalResult<Vec<_>>>()?;

    let x_index = find_role(&axes, SpatialRole::X)
        .ok_or_else(|| ZonalError::metadata("No x (longitude/easting) axis found"))?;
    let y_index = find_role(&axes, SpatialRole::Y)
        .ok_or_else(|| ZonalError::metadata("No y (latitude/northing) axis found"))?;
    axes[x_index].kind = AxisKind::Spatial;
    axes[y_index].kind = AxisKind::Spatial;

    if y_index < x_index {
        debug!(coverage_id = %coverage_id, "Description declares y before x");
    }

    let crs = parse_crs(coverage_id, grid, root);

    let table = find_encoding_table(root)
        .ok_or_else(|| ZonalError::metadata("Description has no Encoding table"))?;
    let encodings = parse_encoding_table(table)?;

    CoverageDescriptor::new(coverage_id, axes, x_index, y_index, crs, encodings)
}

fn find_role(axes: &[AxisDescriptor], role: SpatialRole) -> Option<usize> {
    axes.iter()
        .position(|axis| SpatialRole::classify(&axis.name) == Some(role))
}

fn parse_axis(raw: &Value) -> ZonalResult<AxisDescriptor> {
    let object = raw
        .as_object()
        .ok_or_else(|| ZonalError::metadata("Axis entry is not an object"))?;

    let name = object
        .get("axisLabel")
        .or_else(|| object.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| ZonalError::metadata("Axis entry has no axisLabel"))?
        .to_string();

    Ok(AxisDescriptor {
        name,
        kind: AxisKind::NonSpatial,
        lower_bound: object.get("lowerBound").and_then(as_number),
        upper_bound: object.get("upperBound").and_then(as_number),
        resolution: object.get("resolution").and_then(as_number),
        coordinates: object
            .get("coordinate")
            .and_then(Value::as_array)
            .map(|values| parse_coordinates(values))
            .unwrap_or_default(),
    })
}

/// A number, or a string holding one.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_coordinates(values: &[Value]) -> AxisCoordinates {
    let numeric: Option<Vec<f64>> = values.iter().map(as_number).collect();
    match numeric {
        Some(numbers) => AxisCoordinates::Numeric(numbers),
        None => AxisCoordinates::Labels(
            values
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
    }
}

fn parse_crs(
    coverage_id: &str,
    grid: Option<&Map<String, Value>>,
    root: &Map<String, Value>,
) -> Option<Crs> {
    let name = grid
        .and_then(|g| g.get("srsName"))
        .or_else(|| root.get("crs"))
        .or_else(|| root.get("srsName"))
        .and_then(Value::as_str)?;

    match Crs::parse(name) {
        Ok(crs) => Some(crs),
        Err(e) => {
            warn!(
                coverage_id = %coverage_id,
                srs_name = %name,
                error = %e,
                "Unrecognized CRS in description"
            );
            None
        }
    }
}

/// `metadata.Encoding`, else the first repeated slice's `Encoding`.
fn find_encoding_table(root: &Map<String, Value>) -> Option<&Value> {
    let metadata = root.get("metadata")?;
    if let Some(table) = metadata.get("Encoding") {
        return Some(table);
    }

    let slice = metadata.get("slices")?.get("slice")?;
    let first = match slice {
        Value::Array(slices) => slices.first()?,
        single => single,
    };
    first.get("Encoding")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn axis(label: &str) -> Value {
        json!({"type": "RegularAxis", "axisLabel": label, "lowerBound": 0, "upperBound": 4, "resolution": 1.0})
    }

    #[test]
    fn test_as_number_accepts_numeric_strings() {
        assert_eq!(as_number(&json!("2.5")), Some(2.5));
        assert_eq!(as_number(&json!(3)), Some(3.0));
        assert_eq!(as_number(&json!("1950-01-01")), None);
    }

    #[test]
    fn test_timestamps_are_label_coordinates() {
        let coords = parse_coordinates(&[json!("2020-01-01"), json!("2020-02-01")]);
        assert!(matches!(coords, AxisCoordinates::Labels(ref v) if v.len() == 2));
        let coords = parse_coordinates(&[json!("0"), json!(1)]);
        assert_eq!(coords, AxisCoordinates::Numeric(vec![0.0, 1.0]));
    }

    #[test]
    fn test_top_level_axis_list() {
        let doc = json!({
            "axis": [axis("lon"), axis("lat")],
            "crs": "EPSG:3338",
            "metadata": {"Encoding": {}}
        });
        let descriptor = decode_description("flat", &doc).unwrap();
        let (x, y) = descriptor.spatial_axes();
        assert_eq!((x.name.as_str(), y.name.as_str()), ("lon", "lat"));
        assert_eq!(descriptor.crs, Some(Crs::ALASKA_ALBERS));
        assert_eq!(descriptor.resolution(), Some((1.0, 1.0)));
    }

    #[test]
    fn test_slice_object_encoding() {
        let doc = json!({
            "axis": [axis("X"), axis("Y")],
            "metadata": {"slices": {"slice": {"Encoding": "{'model': {'0': 'CRU-TS'}}"}}}
        });
        let descriptor = decode_description("single_slice", &doc).unwrap();
        assert_eq!(descriptor.label("model", 0).unwrap(), "CRU-TS");
        assert_eq!(descriptor.crs, None);
    }
}
