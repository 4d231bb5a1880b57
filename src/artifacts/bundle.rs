use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ArtifactError, MedianImputer, Model, Predictor, Result, Scaler};
use crate::models::features::{FEATURE_COLUMNS, FEATURE_COUNT};

/// Decision threshold used when the metadata does not carry one.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Flat metadata map stored as `meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub trained_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_columns: Option<Vec<String>>,
    /// Any other keys written by the training job (scores, data ranges, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl BundleMeta {
    pub fn new(trained_at: DateTime<Utc>) -> Self {
        Self {
            name: None,
            threshold: None,
            trained_at,
            feature_columns: Some(FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect()),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold.unwrap_or(DEFAULT_THRESHOLD)
    }
}

/// Model, imputer, optional scaler and metadata fitted together.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactBundle {
    pub model: Model,
    pub imputer: MedianImputer,
    pub scaler: Option<Scaler>,
    pub meta: BundleMeta,
}

impl ArtifactBundle {
    pub fn new(model: Model, imputer: MedianImputer, meta: BundleMeta) -> Self {
        Self {
            model,
            imputer,
            scaler: None,
            meta,
        }
    }

    pub fn with_scaler(mut self, scaler: Scaler) -> Self {
        self.scaler = Some(scaler);
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Cross-check every piece against the feature schema.
    pub fn validate(&self) -> Result<()> {
        let coefficients = self.model.coefficients().len();
        if coefficients != FEATURE_COUNT {
            return Err(ArtifactError::Schema(format!(
                "model has {} coefficients, schema has {} features",
                coefficients, FEATURE_COUNT
            )));
        }

        self.imputer.validate()?;
        if let Some(scaler) = &self.scaler {
            scaler.validate()?;
        }

        if let Some(columns) = &self.meta.feature_columns {
            if columns.iter().map(String::as_str).ne(FEATURE_COLUMNS) {
                return Err(ArtifactError::Schema(format!(
                    "bundle feature columns {:?} do not match {:?}",
                    columns, FEATURE_COLUMNS
                )));
            }
        }

        let threshold = self.meta.threshold();
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ArtifactError::Schema(format!(
                "threshold {} is outside [0, 1]",
                threshold
            )));
        }

        Ok(())
    }
}
