use serde::{Deserialize, Serialize};

/// Result of one inference call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prediction {
    /// Classifier output: positive-class probability and the thresholded class.
    Class { probability: f64, predicted_class: u8 },
    /// Regression-only model output.
    Value { prediction: f64 },
}

impl Prediction {
    pub fn probability(&self) -> Option<f64> {
        match self {
            Prediction::Class { probability, .. } => Some(*probability),
            Prediction::Value { .. } => None,
        }
    }

    pub fn predicted_class(&self) -> Option<u8> {
        match self {
            Prediction::Class {
                predicted_class, ..
            } => Some(*predicted_class),
            Prediction::Value { .. } => None,
        }
    }
}
