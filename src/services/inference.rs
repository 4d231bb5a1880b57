//! Model serving: startup state machine and the predict pipeline.
//!
//! The service is built once at startup and shared read-only by every
//! request handler. States move `Uninitialized -> Ready | Degraded` on the
//! single load attempt and never change afterwards; picking up a new bundle
//! requires a restart.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::artifacts::{
    ArtifactBundle, ArtifactError, ArtifactStore, BundleMeta, MedianImputer, Predictor, Scaler,
};
use crate::common::math::round_to;
use crate::models::features::{FeaturePayload, FeatureRow, FeatureSchemaError, FEATURE_COUNT};
use crate::models::prediction::Prediction;

/// Decimal places kept on returned probabilities.
pub const PROBABILITY_DECIMALS: i32 = 6;

#[derive(Debug, Error)]
pub enum InferenceError {
    /// No usable bundle; redeploy artifacts and restart before retrying.
    #[error("model not loaded: {0}")]
    ServiceUnavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] FeatureSchemaError),

    #[error("model returned an invalid output: {0}")]
    ModelOutput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Uninitialized,
    Ready,
    Degraded,
}

impl ServiceStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, ServiceStatus::Ready)
    }
}

/// Everything a prediction needs, fitted against the same feature schema.
pub struct ModelContext {
    predictor: Arc<dyn Predictor>,
    imputer: MedianImputer,
    scaler: Option<Scaler>,
    meta: BundleMeta,
}

impl ModelContext {
    /// Cross-check the pieces against the feature schema. A mismatch is a
    /// schema error here rather than a failure on the first request.
    pub fn new(
        predictor: Arc<dyn Predictor>,
        imputer: MedianImputer,
        scaler: Option<Scaler>,
        meta: BundleMeta,
    ) -> Result<Self, ArtifactError> {
        if let Some(inputs) = predictor.input_len() {
            if inputs != FEATURE_COUNT {
                return Err(ArtifactError::Schema(format!(
                    "model '{}' expects {} inputs, schema has {} features",
                    predictor.name(),
                    inputs,
                    FEATURE_COUNT
                )));
            }
        }
        imputer.validate()?;
        if let Some(scaler) = &scaler {
            scaler.validate()?;
        }
        let threshold = meta.threshold();
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ArtifactError::Schema(format!(
                "threshold {} is outside [0, 1]",
                threshold
            )));
        }

        Ok(Self {
            predictor,
            imputer,
            scaler,
            meta,
        })
    }

    pub fn from_bundle(bundle: ArtifactBundle) -> Result<Self, ArtifactError> {
        bundle.validate()?;
        Self::new(
            Arc::new(bundle.model),
            bundle.imputer,
            bundle.scaler,
            bundle.meta,
        )
    }

    pub fn meta(&self) -> &BundleMeta {
        &self.meta
    }

    pub fn predictor_name(&self) -> &str {
        self.predictor.name()
    }

    /// Impute, scale when a scaler was fitted, then run the model.
    pub fn predict(&self, row: &FeatureRow) -> Result<Prediction, InferenceError> {
        let mut values = self.imputer.transform(row);
        if let Some(scaler) = &self.scaler {
            scaler.transform(&mut values);
        }

        match self.predictor.predict_proba(&values) {
            Some(probability) => {
                if !(0.0..=1.0).contains(&probability) {
                    return Err(InferenceError::ModelOutput(format!(
                        "probability {} is outside [0, 1]",
                        probability
                    )));
                }
                let predicted_class = u8::from(probability >= self.meta.threshold());
                Ok(Prediction::Class {
                    probability: round_to(probability, PROBABILITY_DECIMALS),
                    predicted_class,
                })
            }
            None => {
                let prediction = self.predictor.predict(&values);
                if !prediction.is_finite() {
                    return Err(InferenceError::ModelOutput(format!(
                        "prediction {} is not finite",
                        prediction
                    )));
                }
                Ok(Prediction::Value { prediction })
            }
        }
    }
}

enum ServiceState {
    Uninitialized,
    Ready(ModelContext),
    Degraded { reason: String },
}

pub struct InferenceService {
    state: ServiceState,
}

impl InferenceService {
    pub fn uninitialized() -> Self {
        Self {
            state: ServiceState::Uninitialized,
        }
    }

    pub fn ready(context: ModelContext) -> Self {
        Self {
            state: ServiceState::Ready(context),
        }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            state: ServiceState::Degraded {
                reason: reason.into(),
            },
        }
    }

    /// Single load attempt. Any artifact problem leaves the service
    /// `Degraded` instead of failing startup.
    pub fn start(store: &ArtifactStore) -> Self {
        match store.load().and_then(ModelContext::from_bundle) {
            Ok(context) => {
                info!(
                    path = %store.root().display(),
                    model = context.predictor_name(),
                    threshold = context.meta().threshold(),
                    "Inference service ready"
                );
                Self::ready(context)
            }
            Err(e) => {
                warn!(
                    path = %store.root().display(),
                    error = %e,
                    "Could not load artifacts, inference service is degraded"
                );
                Self::degraded(e.to_string())
            }
        }
    }

    pub fn status(&self) -> ServiceStatus {
        match self.state {
            ServiceState::Uninitialized => ServiceStatus::Uninitialized,
            ServiceState::Ready(_) => ServiceStatus::Ready,
            ServiceState::Degraded { .. } => ServiceStatus::Degraded,
        }
    }

    pub fn degraded_reason(&self) -> Option<&str> {
        match &self.state {
            ServiceState::Degraded { reason } => Some(reason.as_str()),
            _ => None,
        }
    }

    pub fn context(&self) -> Result<&ModelContext, InferenceError> {
        match &self.state {
            ServiceState::Ready(context) => Ok(context),
            ServiceState::Uninitialized => Err(InferenceError::ServiceUnavailable(
                "artifacts have not been loaded".to_string(),
            )),
            ServiceState::Degraded { reason } => {
                Err(InferenceError::ServiceUnavailable(reason.clone()))
            }
        }
    }

    /// Resolve a client payload into the schema row, then predict.
    pub fn predict(&self, payload: FeaturePayload) -> Result<Prediction, InferenceError> {
        let context = self.context()?;
        let row = payload.into_row()?;
        self.run(context, &row)
    }

    /// Predict on a row that is already in canonical form.
    pub fn predict_row(&self, row: &FeatureRow) -> Result<Prediction, InferenceError> {
        let context = self.context()?;
        self.run(context, row)
    }

    fn run(&self, context: &ModelContext, row: &FeatureRow) -> Result<Prediction, InferenceError> {
        let prediction = context.predict(row)?;
        debug!(
            model = context.predictor_name(),
            complete = row.is_complete(),
            ?prediction,
            "Prediction served"
        );
        Ok(prediction)
    }
}

impl Default for InferenceService {
    fn default() -> Self {
        Self::uninitialized()
    }
}
