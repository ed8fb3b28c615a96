//! Enumeration of non-spatial coordinate combinations.

use coverage::DimensionEncoding;
use itertools::Itertools;
use std::collections::BTreeMap;
use zonal_common::{ZonalError, ZonalResult};

use crate::grid::GridAxis;
use crate::tree::ResultTree;

/// One combination of non-spatial coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination {
    /// Semantic label per axis, in axis order.
    pub labels: Vec<String>,
    /// Position along each axis.
    pub indices: Vec<usize>,
}

/// Every combination of a grid's non-spatial axes, first axis slowest.
///
/// The n-th combination corresponds to the n-th layer of the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinationSet {
    axes: Vec<String>,
    combinations: Vec<Combination>,
}

impl CombinationSet {
    /// Enumerate the cartesian product of `axes`, labelling coordinates
    /// through `encodings`.
    ///
    /// Every coordinate must have a label; a missing encoding or key is a
    /// `DecodeKey` error.
    pub fn enumerate(
        axes: &[GridAxis],
        encodings: &BTreeMap<String, DimensionEncoding>,
    ) -> ZonalResult<Self> {
        let labels: Vec<Vec<String>> = axes
            .iter()
            .map(|axis| axis_labels(axis, encodings))
            .collect::<ZonalResult<_>>()?;

        let positions: Vec<Vec<usize>> = if labels.is_empty() {
            vec![Vec::new()]
        } else {
            labels
                .iter()
                .map(|axis_labels| 0..axis_labels.len())
                .multi_cartesian_product()
                .collect()
        };

        let combinations = positions
            .into_iter()
            .map(|indices| Combination {
                labels: indices
                    .iter()
                    .zip(&labels)
                    .map(|(&i, axis_labels)| axis_labels[i].clone())
                    .collect(),
                indices,
            })
            .collect();

        Ok(Self {
            axes: axes.iter().map(|a| a.name.clone()).collect(),
            combinations,
        })
    }

    pub fn axes(&self) -> &[String] {
        &self.axes
    }

    pub fn combinations(&self) -> &[Combination] {
        &self.combinations
    }

    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    /// A tree with a null leaf for every combination, in enumeration order.
    pub fn empty_tree(&self) -> ZonalResult<ResultTree> {
        let mut tree = ResultTree::new(self.axes.clone());
        for combination in &self.combinations {
            tree.set_leaf(&combination.labels, None)?;
        }
        Ok(tree)
    }
}

fn axis_labels(
    axis: &GridAxis,
    encodings: &BTreeMap<String, DimensionEncoding>,
) -> ZonalResult<Vec<String>> {
    axis.coordinates
        .iter()
        .map(|&coordinate| {
            let code = coordinate.round();
            if !code.is_finite() || (coordinate - code).abs() > 1e-9 {
                return Err(ZonalError::invalid_grid(format!(
                    "Coordinate {} on axis '{}' is not an integer code",
                    coordinate, axis.name
                )));
            }
            let code = code as i64;
            let encoding = encodings
                .get(&axis.name)
                .ok_or_else(|| ZonalError::decode_key(&axis.name, code))?;
            encoding.label(code).map(str::to_string)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encodings(entries: &[(&str, &[&str])]) -> BTreeMap<String, DimensionEncoding> {
        entries
            .iter()
            .map(|(axis, labels)| {
                let table = labels
                    .iter()
                    .enumerate()
                    .map(|(i, l)| (i as i64, l.to_string()))
                    .collect();
                (axis.to_string(), DimensionEncoding::new(*axis, table))
            })
            .collect()
    }

    #[test]
    fn test_era_model_order() {
        let enc = encodings(&[
            ("era", &["1950-2008", "2040-2069"][..]),
            ("model", &["CRU-TS", "GFDL-CM3"][..]),
        ]);
        let axes = vec![
            GridAxis::new("era", vec![0.0, 1.0]),
            GridAxis::new("model", vec![0.0, 1.0]),
        ];

        let set = CombinationSet::enumerate(&axes, &enc).unwrap();
        let labels: Vec<Vec<String>> =
            set.combinations().iter().map(|c| c.labels.clone()).collect();
        assert_eq!(
            labels,
            vec![
                vec!["1950-2008", "CRU-TS"],
                vec!["1950-2008", "GFDL-CM3"],
                vec!["2040-2069", "CRU-TS"],
                vec!["2040-2069", "GFDL-CM3"],
            ]
        );
        assert_eq!(set.combinations()[2].indices, vec![1, 0]);

        let tree = set.empty_tree().unwrap();
        assert_eq!(tree.leaf_count(), 4);
        assert_eq!(tree.levels(), &["era".to_string(), "model".to_string()]);
    }

    #[test]
    fn test_coordinates_follow_grid_order() {
        // Grid returns codes out of numeric order; labels follow positions
        let enc = encodings(&[("scenario", &["historical", "rcp45", "rcp85"][..])]);
        let axes = vec![GridAxis::new("scenario", vec![2.0, 0.0])];
        let set = CombinationSet::enumerate(&axes, &enc).unwrap();
        assert_eq!(set.combinations()[0].labels, vec!["rcp85"]);
        assert_eq!(set.combinations()[1].labels, vec!["historical"]);
    }

    #[test]
    fn test_no_axes_yields_one_empty_path() {
        let set = CombinationSet::enumerate(&[], &BTreeMap::new()).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.combinations()[0].labels.is_empty());
        let tree = set.empty_tree().unwrap();
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn test_missing_label_fails() {
        let enc = encodings(&[("model", &["CRU-TS"][..])]);
        let axes = vec![GridAxis::new("model", vec![0.0, 3.0])];
        let err = CombinationSet::enumerate(&axes, &enc).unwrap_err();
        assert!(matches!(err, ZonalError::DecodeKey { coordinate: 3, .. }));

        let axes = vec![GridAxis::new("era", vec![0.0])];
        let err = CombinationSet::enumerate(&axes, &enc).unwrap_err();
        assert!(matches!(err, ZonalError::DecodeKey { .. }));
    }

    #[test]
    fn test_non_integer_coordinates_fail() {
        let enc = encodings(&[("model", &["CRU-TS"][..])]);
        for bad in [f64::NAN, f64::INFINITY, 0.5] {
            let axes = vec![GridAxis::new("model", vec![bad])];
            let err = CombinationSet::enumerate(&axes, &enc).unwrap_err();
            assert!(matches!(err, ZonalError::InvalidGrid(_)), "{} was accepted", bad);
        }
    }
}
