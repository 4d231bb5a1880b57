//! Feature scaling fitted at training time.

use serde::{Deserialize, Serialize};

use super::{ArtifactError, Result};
use crate::models::features::FEATURE_COUNT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - min) / (max - min)`
    MinMax { min: Vec<f64>, max: Vec<f64> },
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
}

impl Scaler {
    /// Fit a min-max scaler on imputed rows.
    pub fn fit_min_max(rows: &[[f64; FEATURE_COUNT]]) -> Result<Self> {
        let first = rows
            .first()
            .ok_or_else(|| ArtifactError::Schema("cannot fit scaler on zero rows".to_string()))?;
        let mut min = first.to_vec();
        let mut max = first.to_vec();
        for row in &rows[1..] {
            for (i, value) in row.iter().enumerate() {
                min[i] = min[i].min(*value);
                max[i] = max[i].max(*value);
            }
        }
        Ok(Scaler::MinMax { min, max })
    }

    /// Fit a standard scaler (population std) on imputed rows.
    pub fn fit_standard(rows: &[[f64; FEATURE_COUNT]]) -> Result<Self> {
        if rows.is_empty() {
            return Err(ArtifactError::Schema(
                "cannot fit scaler on zero rows".to_string(),
            ));
        }
        let n = rows.len() as f64;
        let mean: Vec<f64> = (0..FEATURE_COUNT)
            .map(|i| rows.iter().map(|r| r[i]).sum::<f64>() / n)
            .collect();
        let scale = (0..FEATURE_COUNT)
            .map(|i| {
                let variance = rows.iter().map(|r| (r[i] - mean[i]).powi(2)).sum::<f64>() / n;
                variance.sqrt()
            })
            .collect();
        Ok(Scaler::Standard { mean, scale })
    }

    /// Scale in place. Constant columns use a unit divisor.
    pub fn transform(&self, row: &mut [f64; FEATURE_COUNT]) {
        match self {
            Scaler::MinMax { min, max } => {
                for (i, value) in row.iter_mut().enumerate() {
                    *value = (*value - min[i]) / non_zero(max[i] - min[i]);
                }
            }
            Scaler::Standard { mean, scale } => {
                for (i, value) in row.iter_mut().enumerate() {
                    *value = (*value - mean[i]) / non_zero(scale[i]);
                }
            }
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let (a, b) = match self {
            Scaler::MinMax { min, max } => (min, max),
            Scaler::Standard { mean, scale } => (mean, scale),
        };
        if a.len() != FEATURE_COUNT || b.len() != FEATURE_COUNT {
            return Err(ArtifactError::Schema(format!(
                "scaler dimensions {}/{} do not match {} features",
                a.len(),
                b.len(),
                FEATURE_COUNT
            )));
        }
        Ok(())
    }
}

fn non_zero(divisor: f64) -> f64 {
    if divisor == 0.0 || !divisor.is_finite() {
        1.0
    } else {
        divisor
    }
}
