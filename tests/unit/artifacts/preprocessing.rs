//! Unit tests for the imputer, scaler and linear models

use pricecast::artifacts::{ArtifactError, MedianImputer, Model, Predictor, Scaler};
use pricecast::models::features::FeatureRow;

fn row(values: [Option<f64>; 7]) -> FeatureRow {
    FeatureRow::from_array(values)
}

#[test]
fn test_imputer_fits_column_medians() {
    let rows = vec![
        row([Some(1.0), Some(10.0), None, Some(1.0), Some(0.0), Some(0.0), Some(100.0)]),
        row([Some(3.0), Some(20.0), Some(5.0), None, Some(0.2), Some(0.0), Some(300.0)]),
        row([Some(2.0), None, Some(7.0), Some(3.0), Some(0.1), Some(0.0), Some(200.0)]),
    ];
    let imputer = MedianImputer::fit(&rows).unwrap();
    assert_eq!(imputer.statistics, vec![2.0, 15.0, 6.0, 2.0, 0.1, 0.0, 200.0]);
}

#[test]
fn test_imputer_fit_requires_observations() {
    let rows = vec![row([Some(1.0), Some(1.0), None, Some(1.0), Some(1.0), Some(1.0), Some(1.0)])];
    assert!(matches!(
        MedianImputer::fit(&rows),
        Err(ArtifactError::Schema(msg)) if msg.contains("MA20")
    ));
}

#[test]
fn test_imputer_fills_positionally() {
    let imputer = MedianImputer::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    let filled = imputer.transform(&row([None, Some(20.0), None, Some(40.0), None, None, Some(70.0)]));
    assert_eq!(filled, [1.0, 20.0, 3.0, 40.0, 5.0, 6.0, 70.0]);
}

#[test]
fn test_min_max_scaler() {
    let rows = [[0.0, 10.0, 5.0, 1.0, -1.0, 2.0, 100.0], [10.0, 20.0, 5.0, 3.0, 1.0, 4.0, 300.0]];
    let scaler = Scaler::fit_min_max(&rows).unwrap();
    let mut values = [5.0, 15.0, 5.0, 2.0, 0.0, 3.0, 200.0];
    scaler.transform(&mut values);
    // Constant column keeps a unit divisor.
    assert_eq!(values, [0.5, 0.5, 0.0, 0.5, 0.5, 0.5, 0.5]);
}

#[test]
fn test_standard_scaler() {
    let rows = [[1.0; 7], [3.0; 7]];
    let scaler = Scaler::fit_standard(&rows).unwrap();
    let mut values = [3.0; 7];
    scaler.transform(&mut values);
    assert_eq!(values, [1.0; 7]);
    assert!(Scaler::fit_standard(&[]).is_err());
}

#[test]
fn test_logistic_model_probability() {
    let model = Model::LogisticRegression {
        coefficients: vec![0.0; 7],
        intercept: 0.0,
    };
    assert_eq!(model.predict_proba(&[1.0; 7]), Some(0.5));
    assert_eq!(model.name(), "logistic_regression");

    let skewed = Model::LogisticRegression {
        coefficients: vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        intercept: 0.0,
    };
    assert!(skewed.predict_proba(&[3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap() > 0.95);
}

#[test]
fn test_linear_model_has_no_probability() {
    let model = Model::LinearRegression {
        coefficients: vec![1.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.5],
        intercept: 1.0,
    };
    let x = [1.0, 1.0, 9.0, 9.0, 9.0, 9.0, 2.0];
    assert_eq!(model.predict_proba(&x), None);
    assert_eq!(model.predict(&x), 5.0);
}

#[test]
fn test_model_json_is_tagged() {
    let model = Model::LinearRegression {
        coefficients: vec![0.0; 7],
        intercept: 0.0,
    };
    let value = serde_json::to_value(&model).unwrap();
    assert_eq!(value["kind"], "linear_regression");
}
