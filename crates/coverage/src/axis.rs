//! Axis descriptions and spatial-axis identification.

use serde::{Deserialize, Serialize};

/// Whether an axis is one of the two spatial axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisKind {
    Spatial,
    NonSpatial,
}

/// Which spatial axis a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialRole {
    /// X (longitude/easting)
    X,
    /// Y (latitude/northing)
    Y,
}

impl SpatialRole {
    /// Classify an axis name, independent of case.
    ///
    /// Recognizes `X`/`Y`, `lon`/`lat` and their long forms, and `E`/`N`.
    pub fn classify(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "x" | "lon" | "long" | "longitude" | "e" | "easting" => Some(SpatialRole::X),
            "y" | "lat" | "latitude" | "n" | "northing" => Some(SpatialRole::Y),
            _ => None,
        }
    }
}

/// Coordinates declared for an axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisCoordinates {
    /// Numeric coordinates (integer codes of encoded axes, or positions).
    Numeric(Vec<f64>),
    /// Non-numeric coordinates such as ISO timestamps.
    Labels(Vec<String>),
}

impl AxisCoordinates {
    pub fn len(&self) -> usize {
        match self {
            AxisCoordinates::Numeric(values) => values.len(),
            AxisCoordinates::Labels(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AxisCoordinates {
    fn default() -> Self {
        AxisCoordinates::Numeric(Vec::new())
    }
}

/// One axis of a coverage, as declared in its description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisDescriptor {
    pub name: String,
    pub kind: AxisKind,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    /// Step between coordinates for regular axes.
    pub resolution: Option<f64>,
    #[serde(default)]
    pub coordinates: AxisCoordinates,
}

impl AxisDescriptor {
    pub fn is_spatial(&self) -> bool {
        self.kind == AxisKind::Spatial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_spatial_names() {
        assert_eq!(SpatialRole::classify("X"), Some(SpatialRole::X));
        assert_eq!(SpatialRole::classify("lon"), Some(SpatialRole::X));
        assert_eq!(SpatialRole::classify("Longitude"), Some(SpatialRole::X));
        assert_eq!(SpatialRole::classify("Y"), Some(SpatialRole::Y));
        assert_eq!(SpatialRole::classify("Lat"), Some(SpatialRole::Y));
        assert_eq!(SpatialRole::classify("model"), None);
        assert_eq!(SpatialRole::classify("era"), None);
    }
}
