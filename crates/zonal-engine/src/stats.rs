//! Summary statistics over masked pixel values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which summary fills the leaves of a result tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    #[default]
    Mean,
    Min,
    Max,
    Count,
}

impl Statistic {
    /// Reduce values, ignoring NaN. None when no value remains, except for
    /// `Count`, which is 0.
    pub fn reduce(self, values: impl IntoIterator<Item = f64>) -> Option<f64> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in values.into_iter().filter(|v| !v.is_nan()) {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }

        match self {
            Statistic::Count => Some(count as f64),
            _ if count == 0 => None,
            Statistic::Mean => Some(sum / count as f64),
            Statistic::Min => Some(min),
            Statistic::Max => Some(max),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Count => "count",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Statistic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(Statistic::Mean),
            "min" => Ok(Statistic::Min),
            "max" => Ok(Statistic::Max),
            "count" => Ok(Statistic::Count),
            other => Err(format!("Unknown statistic '{}'", other)),
        }
    }
}

/// Number of pixels holding one distinct value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: f64,
    pub count: usize,
}

/// Full statistics of the pixels inside a polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonalStats {
    /// Pixels inside the polygon with a value.
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Distinct values, ascending.
    pub unique_values: Vec<ValueCount>,
}

impl ZonalStats {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(f64::total_cmp);

        let mut unique_values: Vec<ValueCount> = Vec::new();
        for &value in &sorted {
            match unique_values.last_mut() {
                Some(last) if last.value == value => last.count += 1,
                _ => unique_values.push(ValueCount { value, count: 1 }),
            }
        }

        let count = sorted.len();
        let mean = (count > 0).then(|| sorted.iter().sum::<f64>() / count as f64);

        Self {
            count,
            mean,
            min: sorted.first().copied(),
            max: sorted.last().copied(),
            unique_values,
        }
    }

    pub fn get(&self, statistic: Statistic) -> Option<f64> {
        match statistic {
            Statistic::Mean => self.mean,
            Statistic::Min => self.min,
            Statistic::Max => self.max,
            Statistic::Count => Some(self.count as f64),
        }
    }
}
