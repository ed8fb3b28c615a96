//! Removal of label combinations that cannot exist for a coverage.
//!
//! Some coverages are dense arrays over axes whose combinations are not
//! all meaningful: a historical baseline model has no future scenarios,
//! and future eras have no historical scenario. Those cells come back from
//! aggregation as values (or nulls) and are removed here by declarative
//! rules, after aggregation.
//!
//! Rules load from YAML or JSON:
//!
//! ```yaml
//! rules:
//!   - name: baseline-model-only-historical
//!     when:
//!       - axis: era
//!         not_in: ["1950-2008"]
//!       - axis: model
//!         in: ["CRU-TS"]
//! ```
//!
//! A rule removes, for every path whose labels satisfy all of its
//! conditions, the node at the deepest axis the rule mentions.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};
use zonal_common::{ZonalError, ZonalResult};

use crate::tree::ResultTree;

/// A membership test on one axis label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    In(Vec<String>),
    NotIn(Vec<String>),
}

impl Condition {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            Condition::In(labels) => labels.iter().any(|l| l == label),
            Condition::NotIn(labels) => !labels.iter().any(|l| l == label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisCondition {
    pub axis: String,
    #[serde(flatten)]
    pub condition: Condition,
}

impl AxisCondition {
    pub fn is_in(axis: &str, labels: &[&str]) -> Self {
        Self {
            axis: axis.to_string(),
            condition: Condition::In(labels.iter().map(|l| l.to_string()).collect()),
        }
    }

    pub fn not_in(axis: &str, labels: &[&str]) -> Self {
        Self {
            axis: axis.to_string(),
            condition: Condition::NotIn(labels.iter().map(|l| l.to_string()).collect()),
        }
    }
}

/// One exclusion rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityRule {
    pub name: String,
    pub when: Vec<AxisCondition>,
}

impl ValidityRule {
    /// Remove every matching node from `tree`. Returns the number removed,
    /// or None when the rule mentions an axis the tree does not have.
    pub fn apply(&self, tree: &mut ResultTree) -> Option<usize> {
        let levels: Vec<usize> = self
            .when
            .iter()
            .map(|c| tree.levels().iter().position(|level| *level == c.axis))
            .collect::<Option<_>>()?;
        let depth = levels.iter().max().map_or(0, |deepest| deepest + 1);
        if depth == 0 {
            return Some(0);
        }

        let matching: Vec<Vec<String>> = tree
            .paths_at(depth)
            .into_iter()
            .filter(|path| {
                self.when
                    .iter()
                    .zip(&levels)
                    .all(|(c, &level)| c.condition.matches(&path[level]))
            })
            .collect();

        for path in &matching {
            tree.remove(path);
        }
        Some(matching.len())
    }
}

/// An ordered set of exclusion rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityRules {
    pub rules: Vec<ValidityRule>,
}

impl ValidityRules {
    pub fn new(rules: Vec<ValidityRule>) -> Self {
        Self { rules }
    }

    /// Rules for coverages over `era`, `model` and `scenario`.
    ///
    /// The baseline model exists only in historical eras and only under
    /// the historical scenario. Projected models in historical eras carry
    /// no historical scenario, and future eras carry neither the baseline
    /// model nor the historical scenario.
    pub fn climate_eras(
        historical_eras: &[&str],
        baseline_model: &str,
        historical_scenario: &str,
    ) -> Self {
        Self::new(vec![
            ValidityRule {
                name: "historical-era-models-drop-historical-scenario".to_string(),
                when: vec![
                    AxisCondition::is_in("era", historical_eras),
                    AxisCondition::not_in("model", &[baseline_model]),
                    AxisCondition::is_in("scenario", &[historical_scenario]),
                ],
            },
            ValidityRule {
                name: "future-eras-drop-baseline-model".to_string(),
                when: vec![
                    AxisCondition::not_in("era", historical_eras),
                    AxisCondition::is_in("model", &[baseline_model]),
                ],
            },
            ValidityRule {
                name: "future-eras-drop-historical-scenario".to_string(),
                when: vec![
                    AxisCondition::not_in("era", historical_eras),
                    AxisCondition::is_in("scenario", &[historical_scenario]),
                ],
            },
            ValidityRule {
                name: "baseline-model-only-historical-scenario".to_string(),
                when: vec![
                    AxisCondition::is_in("era", historical_eras),
                    AxisCondition::is_in("model", &[baseline_model]),
                    AxisCondition::not_in("scenario", &[historical_scenario]),
                ],
            },
        ])
    }

    pub fn from_yaml_str(text: &str) -> ZonalResult<Self> {
        serde_yaml::from_str(text).map_err(|e| invalid_rules(&e))
    }

    pub fn from_json_str(text: &str) -> ZonalResult<Self> {
        serde_json::from_str(text).map_err(|e| invalid_rules(&e))
    }

    /// Load rules from a `.json`, `.yaml` or `.yml` file.
    pub fn from_path(path: &Path) -> ZonalResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ZonalError::Io(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule in order. Returns the number of nodes removed.
    pub fn apply(&self, tree: &mut ResultTree) -> usize {
        let mut removed = 0;
        for rule in &self.rules {
            match rule.apply(tree) {
                Some(count) => {
                    debug!(rule = %rule.name, removed = count, "Applied validity rule");
                    removed += count;
                }
                None => warn!(
                    rule = %rule.name,
                    levels = ?tree.levels(),
                    "Skipping rule for axes not in result"
                ),
            }
        }
        removed
    }
}

fn invalid_rules(err: &dyn std::fmt::Display) -> ZonalError {
    ZonalError::Config(format!("Invalid validity rules: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_matches() {
        let c = Condition::In(vec!["a".into(), "b".into()]);
        assert!(c.matches("a"));
        assert!(!c.matches("c"));
        assert!(Condition::NotIn(vec!["a".into()]).matches("c"));
    }

    #[test]
    fn test_load_yaml() {
        let yaml = r#"
rules:
  - name: drop-baseline
    when:
      - axis: model
        in: [CRU-TS]
"#;
        let rules = ValidityRules::from_yaml_str(yaml).unwrap();
        assert_eq!(rules.rules.len(), 1);
        assert_eq!(rules.rules[0].when[0], AxisCondition::is_in("model", &["CRU-TS"]));
    }

    #[test]
    fn test_load_json() {
        let json =
            r#"{"rules": [{"name": "r", "when": [{"axis": "era", "not_in": ["1950-2008"]}]}]}"#;
        let rules = ValidityRules::from_json_str(json).unwrap();
        assert_eq!(rules.rules[0].when[0], AxisCondition::not_in("era", &["1950-2008"]));
    }

    #[test]
    fn test_unknown_condition_is_config_error() {
        let yaml = "rules:\n  - name: r\n    when:\n      - axis: era\n        equals: x\n";
        let err = ValidityRules::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ZonalError::Config(_)));
    }

    #[test]
    fn test_rule_for_absent_axis_is_skipped() {
        let mut tree = ResultTree::new(vec!["model".to_string()]);
        tree.set_leaf(&["CRU-TS"], Some(1.0)).unwrap();
        let rules = ValidityRules::new(vec![ValidityRule {
            name: "r".to_string(),
            when: vec![AxisCondition::is_in("era", &["x"])],
        }]);
        assert_eq!(rules.apply(&mut tree), 0);
        assert_eq!(tree.leaf_count(), 1);
    }
}
