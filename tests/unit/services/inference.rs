//! Unit tests for the inference service

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use pricecast::artifacts::{
    ArtifactBundle, ArtifactError, ArtifactStore, BundleMeta, MedianImputer, Model, Predictor,
    Scaler,
};
use pricecast::models::features::{FeaturePayload, FeatureRow, FeatureSchemaError};
use pricecast::models::prediction::Prediction;
use pricecast::services::inference::{InferenceError, InferenceService, ModelContext, ServiceStatus};
use tempfile::tempdir;

/// Returns a fixed output and records every row it is called with.
struct FakePredictor {
    probability: Option<f64>,
    value: f64,
    calls: AtomicUsize,
    last_row: Mutex<Vec<f64>>,
}

impl FakePredictor {
    fn classifier(probability: f64) -> Arc<Self> {
        Arc::new(Self {
            probability: Some(probability),
            value: 0.0,
            calls: AtomicUsize::new(0),
            last_row: Mutex::new(Vec::new()),
        })
    }

    fn regressor(value: f64) -> Arc<Self> {
        Arc::new(Self {
            probability: None,
            value,
            calls: AtomicUsize::new(0),
            last_row: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_row(&self) -> Vec<f64> {
        self.last_row.lock().unwrap().clone()
    }
}

impl Predictor for FakePredictor {
    fn predict_proba(&self, row: &[f64]) -> Option<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_row.lock().unwrap() = row.to_vec();
        self.probability
    }

    fn predict(&self, row: &[f64]) -> f64 {
        *self.last_row.lock().unwrap() = row.to_vec();
        self.value
    }

    fn name(&self) -> &str {
        "fake"
    }
}

fn unit_imputer() -> MedianImputer {
    MedianImputer::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0])
}

fn meta(threshold: Option<f64>) -> BundleMeta {
    let meta = BundleMeta::new(Utc::now());
    match threshold {
        Some(t) => meta.with_threshold(t),
        None => meta,
    }
}

fn service_with(predictor: Arc<FakePredictor>, threshold: Option<f64>) -> InferenceService {
    InferenceService::ready(
        ModelContext::new(predictor, unit_imputer(), None, meta(threshold)).unwrap(),
    )
}

fn full_payload() -> FeaturePayload {
    FeaturePayload::ByPosition(vec![
        Some(101.2),
        Some(100.8),
        Some(100.1),
        Some(0.012),
        Some(0.004),
        Some(-0.002),
        Some(1300.0),
    ])
}

#[test]
fn test_uninitialized_service_is_unavailable() {
    let service = InferenceService::default();
    assert_eq!(service.status(), ServiceStatus::Uninitialized);
    assert!(matches!(
        service.predict(full_payload()),
        Err(InferenceError::ServiceUnavailable(_))
    ));
}

#[test]
fn test_degraded_service_is_unavailable() {
    let service = InferenceService::degraded("artifact not found: artifacts/model.json");
    assert_eq!(service.status(), ServiceStatus::Degraded);
    assert_eq!(
        service.degraded_reason(),
        Some("artifact not found: artifacts/model.json")
    );
    assert!(matches!(
        service.predict(full_payload()),
        Err(InferenceError::ServiceUnavailable(_))
    ));
    assert!(service.predict_row(&FeatureRow::default()).is_err());
}

#[test]
fn test_start_without_artifacts_degrades() {
    let dir = tempdir().unwrap();
    let service = InferenceService::start(&ArtifactStore::new(dir.path().join("missing")));
    assert_eq!(service.status(), ServiceStatus::Degraded);
    assert!(service.degraded_reason().unwrap().contains("model.json"));
}

#[test]
fn test_start_with_saved_bundle_is_ready() {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    let bundle = ArtifactBundle::new(
        Model::LogisticRegression {
            coefficients: vec![0.0; 7],
            intercept: 0.0,
        },
        unit_imputer(),
        meta(None),
    );
    store.save(&bundle).unwrap();

    let service = InferenceService::start(&store);
    assert!(service.status().is_ready());
    assert_eq!(service.degraded_reason(), None);
    assert_eq!(service.context().unwrap().predictor_name(), "logistic_regression");
}

#[test]
fn test_wrong_length_never_reaches_model() {
    let predictor = FakePredictor::classifier(0.9);
    let service = service_with(predictor.clone(), None);

    let result = service.predict(FeaturePayload::ByPosition(vec![Some(1.0), Some(2.0), Some(3.0)]));
    assert!(matches!(
        result,
        Err(InferenceError::InvalidInput(FeatureSchemaError::WrongLength { expected: 7, got: 3 }))
    ));
    assert_eq!(predictor.calls(), 0);
}

#[test]
fn test_unknown_name_is_rejected() {
    let predictor = FakePredictor::classifier(0.9);
    let service = service_with(predictor.clone(), None);

    let mut named: BTreeMap<String, Option<f64>> = BTreeMap::new();
    named.insert("RSI".to_string(), Some(55.0));
    let result = service.predict(FeaturePayload::ByName(named));
    assert!(matches!(result, Err(InferenceError::InvalidInput(_))));
    assert_eq!(predictor.calls(), 0);
}

#[test]
fn test_default_threshold_is_inclusive() {
    let predictor = FakePredictor::classifier(0.5);
    let service = service_with(predictor.clone(), None);

    let prediction = service.predict(full_payload()).unwrap();
    assert_eq!(
        prediction,
        Prediction::Class {
            probability: 0.5,
            predicted_class: 1
        }
    );
    assert_eq!(predictor.calls(), 1);
}

#[test]
fn test_custom_threshold() {
    let service = service_with(FakePredictor::classifier(0.6), Some(0.7));
    let prediction = service.predict(full_payload()).unwrap();
    assert_eq!(prediction.predicted_class(), Some(0));

    let service = service_with(FakePredictor::classifier(0.7), Some(0.7));
    let prediction = service.predict(full_payload()).unwrap();
    assert_eq!(prediction.predicted_class(), Some(1));
}

#[test]
fn test_probability_is_rounded() {
    let service = service_with(FakePredictor::classifier(0.123456789), None);
    let prediction = service.predict(full_payload()).unwrap();
    assert_eq!(prediction.probability(), Some(0.123457));
    assert_eq!(prediction.predicted_class(), Some(0));
}

#[test]
fn test_probability_out_of_range_is_model_error() {
    let service = service_with(FakePredictor::classifier(1.5), None);
    assert!(matches!(
        service.predict(full_payload()),
        Err(InferenceError::ModelOutput(_))
    ));
}

#[test]
fn test_regression_model_returns_value() {
    let service = service_with(FakePredictor::regressor(0.0042), None);
    let prediction = service.predict(full_payload()).unwrap();
    assert_eq!(prediction, Prediction::Value { prediction: 0.0042 });
    assert_eq!(prediction.probability(), None);

    let service = service_with(FakePredictor::regressor(f64::NAN), None);
    assert!(matches!(
        service.predict(full_payload()),
        Err(InferenceError::ModelOutput(_))
    ));
}

#[test]
fn test_missing_values_are_imputed() {
    let predictor = FakePredictor::classifier(0.4);
    let service = service_with(predictor.clone(), None);

    let payload = FeaturePayload::ByPosition(vec![
        None,
        Some(10.0),
        None,
        Some(0.5),
        None,
        None,
        Some(70.0),
    ]);
    service.predict(payload).unwrap();
    assert_eq!(predictor.last_row(), vec![1.0, 10.0, 3.0, 0.5, 5.0, 6.0, 70.0]);
}

#[test]
fn test_named_payload_matches_positional() {
    let predictor = FakePredictor::classifier(0.4);
    let service = service_with(predictor.clone(), None);

    let mut named: BTreeMap<String, Option<f64>> = BTreeMap::new();
    for (name, value) in ["Volume", "Lag2", "Lag1", "Volatility20", "MA20", "MA10", "MA5"]
        .iter()
        .zip([70.0, 60.0, 50.0, 40.0, 30.0, 20.0, 10.0])
    {
        named.insert(name.to_string(), Some(value));
    }
    service.predict(FeaturePayload::ByName(named)).unwrap();
    assert_eq!(
        predictor.last_row(),
        vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0]
    );
}

#[test]
fn test_scaler_runs_after_imputation() {
    let predictor = FakePredictor::classifier(0.4);
    let scaler = Scaler::Standard {
        mean: vec![1.0; 7],
        scale: vec![2.0; 7],
    };
    let context =
        ModelContext::new(predictor.clone(), unit_imputer(), Some(scaler), meta(None)).unwrap();
    let service = InferenceService::ready(context);

    service
        .predict(FeaturePayload::ByPosition(vec![None, None, None, None, None, None, Some(9.0)]))
        .unwrap();
    assert_eq!(predictor.last_row(), vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 4.0]);
}

#[test]
fn test_logistic_bundle_end_to_end() {
    // sigmoid(ln(0.7 / 0.3)) == 0.7
    let bundle = ArtifactBundle::new(
        Model::LogisticRegression {
            coefficients: vec![0.0; 7],
            intercept: (0.7f64 / 0.3).ln(),
        },
        unit_imputer(),
        meta(None),
    );
    let service = InferenceService::ready(ModelContext::from_bundle(bundle).unwrap());
    let prediction = service.predict_row(&FeatureRow::default()).unwrap();
    assert_eq!(
        prediction,
        Prediction::Class {
            probability: 0.7,
            predicted_class: 1
        }
    );
}

#[test]
fn test_context_rejects_short_imputer() {
    let result = ModelContext::new(
        FakePredictor::classifier(0.5),
        MedianImputer::new(vec![1.0; 3]),
        None,
        meta(None),
    );
    assert!(matches!(result, Err(ArtifactError::Schema(_))));
}

#[test]
fn test_context_rejects_short_scaler() {
    let scaler = Scaler::MinMax {
        min: vec![0.0; 7],
        max: vec![1.0; 2],
    };
    let result = ModelContext::new(
        FakePredictor::classifier(0.5),
        unit_imputer(),
        Some(scaler),
        meta(None),
    );
    assert!(matches!(result, Err(ArtifactError::Schema(_))));
}

#[test]
fn test_context_rejects_model_with_wrong_input_count() {
    let model = Model::LinearRegression {
        coefficients: vec![1.0; 5],
        intercept: 0.0,
    };
    let result = ModelContext::new(Arc::new(model), unit_imputer(), None, meta(None));
    assert!(matches!(result, Err(ArtifactError::Schema(msg)) if msg.contains("expects 5 inputs")));
}

#[test]
fn test_context_rejects_threshold_out_of_range() {
    let result = ModelContext::new(
        FakePredictor::classifier(0.5),
        unit_imputer(),
        None,
        meta(Some(1.5)),
    );
    assert!(matches!(result, Err(ArtifactError::Schema(_))));
}

#[test]
fn test_from_bundle_rejects_mismatched_bundle() {
    let bundle = ArtifactBundle::new(
        Model::LogisticRegression {
            coefficients: vec![0.0; 7],
            intercept: 0.0,
        },
        MedianImputer::new(vec![0.0; 6]),
        meta(None),
    );
    assert!(ModelContext::from_bundle(bundle).is_err());
}
