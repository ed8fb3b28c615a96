//! Cleanup of populated result trees before they are returned.

use serde::{Deserialize, Serialize};
use tracing::debug;
use zonal_common::{ZonalError, ZonalResult};

use crate::tree::{ResultNode, ResultTree};

impl ResultTree {
    /// Replace leaves equal to any nodata sentinel with null.
    pub fn nullify(&mut self, nodata: &[f64]) {
        if nodata.is_empty() {
            return;
        }
        self.root_mut().for_each_leaf_mut(&mut |value| {
            if value.is_some_and(|v| nodata.contains(&v)) {
                *value = None;
            }
        });
    }

    /// Remove null leaves and the branches they leave empty. Returns
    /// whether any value remains.
    pub fn prune(&mut self) -> bool {
        fn keep(node: &mut ResultNode) -> bool {
            match node {
                ResultNode::Leaf(value) => value.is_some(),
                ResultNode::Branch(children) => {
                    children.retain(|_, child| keep(child));
                    !children.is_empty()
                }
            }
        }
        keep(self.root_mut())
    }

    /// Round every numeric leaf to `places` decimals.
    pub fn round(&mut self, places: u32) {
        let scale = 10f64.powi(places as i32);
        self.root_mut().for_each_leaf_mut(&mut |value| {
            if let Some(v) = value {
                *v = (*v * scale).round() / scale;
            }
        });
    }
}

/// How to finish a populated tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalizeOptions {
    pub nodata: Vec<f64>,
    pub round_places: Option<u32>,
}

/// A finished aggregation: a tree with at least one value, or nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum ZonalOutcome {
    Value(ResultTree),
    NoData,
}

impl ZonalOutcome {
    pub fn is_no_data(&self) -> bool {
        matches!(self, ZonalOutcome::NoData)
    }

    /// The tree, or a `NoData` error.
    pub fn into_result(self) -> ZonalResult<ResultTree> {
        match self {
            ZonalOutcome::Value(tree) => Ok(tree),
            ZonalOutcome::NoData => Err(ZonalError::NoData(
                "No data available for the requested area".to_string(),
            )),
        }
    }
}

/// Nullify sentinels, prune, then round.
pub fn finalize(mut tree: ResultTree, options: &FinalizeOptions) -> ZonalOutcome {
    tree.nullify(&options.nodata);
    if !tree.prune() {
        debug!(levels = ?tree.levels(), "Result tree holds no data after pruning");
        return ZonalOutcome::NoData;
    }
    if let Some(places) = options.round_places {
        tree.round(places);
    }
    ZonalOutcome::Value(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ResultTree {
        let mut tree = ResultTree::new(vec!["era".to_string(), "model".to_string()]);
        tree.set_leaf(&["a", "x"], Some(1.23456)).unwrap();
        tree.set_leaf(&["a", "y"], Some(-9999.0)).unwrap();
        tree.set_leaf(&["b", "x"], None).unwrap();
        tree
    }

    #[test]
    fn test_nullify_and_prune() {
        let mut tree = sample();
        tree.nullify(&[-9999.0]);
        assert_eq!(tree.get_value(&["a", "y"]).unwrap(), None);
        assert!(tree.prune());
        assert_eq!(tree.to_json(), json!({"a": {"x": 1.23456}}));
    }

    #[test]
    fn test_round() {
        let mut tree = sample();
        tree.round(2);
        assert_eq!(tree.get_value(&["a", "x"]).unwrap(), Some(1.23));
    }

    #[test]
    fn test_finalize_no_data() {
        let mut tree = ResultTree::new(vec!["era".to_string()]);
        tree.set_leaf(&["a"], Some(-9999.0)).unwrap();
        tree.set_leaf(&["b"], None).unwrap();

        let options = FinalizeOptions {
            nodata: vec![-9999.0],
            round_places: None,
        };
        let outcome = finalize(tree, &options);
        assert!(outcome.is_no_data());
        assert!(matches!(outcome.into_result(), Err(ZonalError::NoData(_))));
    }

    #[test]
    fn test_finalize_value() {
        let options = FinalizeOptions {
            nodata: vec![-9999.0],
            round_places: Some(1),
        };
        let tree = finalize(sample(), &options).into_result().unwrap();
        assert_eq!(tree.to_json(), json!({"a": {"x": 1.2}}));
    }

    #[test]
    fn test_depth_zero_prune() {
        let tree = ResultTree::new(Vec::new());
        assert!(finalize(tree, &FinalizeOptions::default()).is_no_data());
    }
}
