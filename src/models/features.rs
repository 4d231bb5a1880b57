//! Model input schema and engineered feature rows.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered feature names. This order is the model input schema; changing it
/// invalidates every stored artifact bundle.
pub const FEATURE_COLUMNS: [&str; 7] = ["MA5", "MA10", "MA20", "Volatility20", "Lag1", "Lag2", "Volume"];

pub const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureSchemaError {
    #[error("expected {expected} feature values, got {got}")]
    WrongLength { expected: usize, got: usize },

    #[error("unknown feature '{0}'")]
    UnknownFeature(String),

    #[error("missing feature '{0}'")]
    MissingFeature(String),
}

/// One model input row. `None` means "missing": either not enough history or
/// a non-finite computation. Imputation fills it at inference time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    #[serde(rename = "MA5")]
    pub ma5: Option<f64>,
    #[serde(rename = "MA10")]
    pub ma10: Option<f64>,
    #[serde(rename = "MA20")]
    pub ma20: Option<f64>,
    #[serde(rename = "Volatility20")]
    pub volatility20: Option<f64>,
    #[serde(rename = "Lag1")]
    pub lag1: Option<f64>,
    #[serde(rename = "Lag2")]
    pub lag2: Option<f64>,
    #[serde(rename = "Volume")]
    pub volume: Option<f64>,
}

impl FeatureRow {
    /// Values in `FEATURE_COLUMNS` order.
    pub fn to_array(&self) -> [Option<f64>; FEATURE_COUNT] {
        [
            self.ma5,
            self.ma10,
            self.ma20,
            self.volatility20,
            self.lag1,
            self.lag2,
            self.volume,
        ]
    }

    pub fn from_array(values: [Option<f64>; FEATURE_COUNT]) -> Self {
        let [ma5, ma10, ma20, volatility20, lag1, lag2, volume] = values;
        Self {
            ma5,
            ma10,
            ma20,
            volatility20,
            lag1,
            lag2,
            volume,
        }
    }

    pub fn from_positional(values: &[Option<f64>]) -> Result<Self, FeatureSchemaError> {
        let values: [Option<f64>; FEATURE_COUNT] =
            values
                .try_into()
                .map_err(|_| FeatureSchemaError::WrongLength {
                    expected: FEATURE_COUNT,
                    got: values.len(),
                })?;
        Ok(Self::from_array(values))
    }

    /// Every schema name must be present and nothing else; `null` is allowed
    /// and means missing.
    pub fn from_named(values: &BTreeMap<String, Option<f64>>) -> Result<Self, FeatureSchemaError> {
        if let Some(unknown) = values.keys().find(|k| !FEATURE_COLUMNS.contains(&k.as_str())) {
            return Err(FeatureSchemaError::UnknownFeature(unknown.clone()));
        }

        let mut ordered = [None; FEATURE_COUNT];
        for (slot, name) in ordered.iter_mut().zip(FEATURE_COLUMNS) {
            *slot = *values
                .get(name)
                .ok_or_else(|| FeatureSchemaError::MissingFeature(name.to_string()))?;
        }
        Ok(Self::from_array(ordered))
    }

    pub fn is_complete(&self) -> bool {
        self.to_array().iter().all(Option::is_some)
    }
}

/// Feature values as submitted by a client, either keyed by feature name or
/// in schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeaturePayload {
    ByPosition(Vec<Option<f64>>),
    ByName(BTreeMap<String, Option<f64>>),
}

impl FeaturePayload {
    pub fn into_row(self) -> Result<FeatureRow, FeatureSchemaError> {
        match self {
            FeaturePayload::ByPosition(values) => FeatureRow::from_positional(&values),
            FeaturePayload::ByName(values) => FeatureRow::from_named(&values),
        }
    }
}

impl From<FeatureRow> for FeaturePayload {
    fn from(row: FeatureRow) -> Self {
        FeaturePayload::ByPosition(row.to_array().to_vec())
    }
}

/// Output of the feature builder for one input bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeredRow {
    #[serde(rename = "Date", with = "super::price::iso_date")]
    pub date: NaiveDate,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Return")]
    pub ret: Option<f64>,
    /// 1 when the next bar's return is positive; training label only.
    #[serde(rename = "Target")]
    pub target: Option<u8>,
    #[serde(flatten)]
    pub features: FeatureRow,
}
