//! Per-column median imputation.

use serde::{Deserialize, Serialize};

use super::{ArtifactError, Result};
use crate::common::math;
use crate::models::features::{FeatureRow, FEATURE_COLUMNS, FEATURE_COUNT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianImputer {
    /// Fill value per column, in `FEATURE_COLUMNS` order.
    pub statistics: Vec<f64>,
}

impl MedianImputer {
    pub fn new(statistics: Vec<f64>) -> Self {
        Self { statistics }
    }

    /// Fit on training rows; every column needs at least one observed value.
    pub fn fit(rows: &[FeatureRow]) -> Result<Self> {
        let mut statistics = Vec::with_capacity(FEATURE_COUNT);
        for (column, name) in FEATURE_COLUMNS.iter().enumerate() {
            let observed: Vec<f64> = rows.iter().filter_map(|r| r.to_array()[column]).collect();
            let median = math::median(&observed).ok_or_else(|| {
                ArtifactError::Schema(format!("column '{}' has no observed values", name))
            })?;
            statistics.push(median);
        }
        Ok(Self { statistics })
    }

    /// Fill missing values positionally.
    pub fn transform(&self, row: &FeatureRow) -> [f64; FEATURE_COUNT] {
        let values = row.to_array();
        std::array::from_fn(|i| values[i].unwrap_or(self.statistics[i]))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.statistics.len() != FEATURE_COUNT {
            return Err(ArtifactError::Schema(format!(
                "imputer has {} statistics, schema has {} features",
                self.statistics.len(),
                FEATURE_COUNT
            )));
        }
        if self.statistics.iter().any(|s| !s.is_finite()) {
            return Err(ArtifactError::Schema(
                "imputer statistics must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
