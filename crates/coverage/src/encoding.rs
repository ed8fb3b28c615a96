//! Dimension encodings: integer axis coordinate -> semantic label.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use zonal_common::{ZonalError, ZonalResult};

/// Label table for one axis.
///
/// Lookup is by key; the order in which the source listed entries carries
/// no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionEncoding {
    pub axis: String,
    labels: BTreeMap<i64, String>,
}

impl DimensionEncoding {
    pub fn new(axis: impl Into<String>, labels: BTreeMap<i64, String>) -> Self {
        Self {
            axis: axis.into(),
            labels,
        }
    }

    /// Label for a coordinate, or a `DecodeKey` error.
    pub fn label(&self, coordinate: i64) -> ZonalResult<&str> {
        self.labels
            .get(&coordinate)
            .map(String::as_str)
            .ok_or_else(|| ZonalError::decode_key(&self.axis, coordinate))
    }

    pub fn labels(&self) -> &BTreeMap<i64, String> {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Parse an encoding table into per-axis encodings.
///
/// The table is either a JSON object or a string holding a serialized
/// object, written as JSON or as a single-quoted literal
/// (`{'model': {'0': 'CRU-TS'}}`). Entries whose value is not an object
/// carry no axis labels and are skipped.
pub fn parse_encoding_table(table: &Value) -> ZonalResult<BTreeMap<String, DimensionEncoding>> {
    let parsed;
    let object = match table {
        Value::Object(map) => map,
        Value::String(text) => {
            parsed = parse_serialized_table(text)?;
            match &parsed {
                Value::Object(map) => map,
                _ => return Err(ZonalError::metadata("Encoding table is not an object")),
            }
        }
        _ => return Err(ZonalError::metadata("Encoding table is not an object")),
    };

    let mut encodings = BTreeMap::new();
    for (axis, entries) in object {
        let Value::Object(entries) = entries else {
            tracing::debug!(axis = %axis, "Skipping non-table encoding entry");
            continue;
        };

        let mut labels = BTreeMap::new();
        for (key, label) in entries {
            let code: i64 = key.trim().parse().map_err(|_| {
                ZonalError::metadata(format!(
                    "Encoding key '{}' on axis '{}' is not an integer",
                    key, axis
                ))
            })?;
            let label = match label {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            labels.insert(code, label);
        }
        encodings.insert(axis.clone(), DimensionEncoding::new(axis.clone(), labels));
    }

    Ok(encodings)
}

fn parse_serialized_table(text: &str) -> ZonalResult<Value> {
    serde_json::from_str(text)
        .or_else(|_| serde_json::from_str(&single_quoted_to_json(text)))
        .map_err(|e| ZonalError::metadata(format!("Unparsable encoding table: {}", e)))
}

/// Rewrite single-quoted string literals as JSON double-quoted strings.
fn single_quoted_to_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(_), '\\') => {
                if let Some(next) = chars.next() {
                    if next == '\'' {
                        out.push('\'');
                    } else {
                        out.push('\\');
                        out.push(next);
                    }
                }
            }
            (Some(q), c) if c == q => {
                out.push('"');
                quote = None;
            }
            (Some('\''), '"') => out.push_str("\\\""),
            (Some(_), c) => out.push(c),
            (None, '\'') | (None, '"') => {
                out.push('"');
                quote = Some(ch);
            }
            (None, c) => out.push(c),
        }
    }

    out
}
