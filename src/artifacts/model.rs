//! Serializable linear models and the predictor interface used at serving time.

use serde::{Deserialize, Serialize};

/// Interface for fitted models.
///
/// Rows are already imputed and scaled, in `FEATURE_COLUMNS` order.
pub trait Predictor: Send + Sync {
    /// Probability of the positive class, or `None` for regression-only models.
    fn predict_proba(&self, row: &[f64]) -> Option<f64>;

    /// Raw model output (the decision value for classifiers).
    fn predict(&self, row: &[f64]) -> f64;

    /// Model name/type
    fn name(&self) -> &str;

    /// Number of inputs the model was fitted on, when it is known.
    fn input_len(&self) -> Option<usize> {
        None
    }
}

/// A fitted linear model as exported by the training job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    LogisticRegression { coefficients: Vec<f64>, intercept: f64 },
    LinearRegression { coefficients: Vec<f64>, intercept: f64 },
}

impl Model {
    pub fn coefficients(&self) -> &[f64] {
        match self {
            Model::LogisticRegression { coefficients, .. }
            | Model::LinearRegression { coefficients, .. } => coefficients,
        }
    }

    fn intercept(&self) -> f64 {
        match self {
            Model::LogisticRegression { intercept, .. }
            | Model::LinearRegression { intercept, .. } => *intercept,
        }
    }

    fn linear_term(&self, row: &[f64]) -> f64 {
        self.coefficients()
            .iter()
            .zip(row)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept()
    }
}

impl Predictor for Model {
    fn predict_proba(&self, row: &[f64]) -> Option<f64> {
        match self {
            Model::LogisticRegression { .. } => Some(sigmoid(self.linear_term(row))),
            Model::LinearRegression { .. } => None,
        }
    }

    fn predict(&self, row: &[f64]) -> f64 {
        self.linear_term(row)
    }

    fn name(&self) -> &str {
        match self {
            Model::LogisticRegression { .. } => "logistic_regression",
            Model::LinearRegression { .. } => "linear_regression",
        }
    }

    fn input_len(&self) -> Option<usize> {
        Some(self.coefficients().len())
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
