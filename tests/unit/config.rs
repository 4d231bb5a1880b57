//! Unit tests for service configuration

use std::path::PathBuf;

use pricecast::config::{is_production_environment, ServiceConfig, DEFAULT_PORT};

#[test]
fn test_default_config() {
    let config = ServiceConfig::default();
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.artifact_dir, PathBuf::from("artifacts"));
    assert_eq!(config.data_dir, PathBuf::from("data"));
    assert!(!config.is_production());
}

#[test]
fn test_is_production() {
    let config = ServiceConfig {
        environment: "production".to_string(),
        ..ServiceConfig::default()
    };
    assert!(config.is_production());

    let config = ServiceConfig {
        environment: "prod".to_string(),
        ..ServiceConfig::default()
    };
    assert!(config.is_production());
}

#[test]
fn test_production_environment_names() {
    assert!(is_production_environment("production"));
    assert!(is_production_environment("prod"));
    assert!(!is_production_environment("sandbox"));
    assert!(!is_production_environment("staging"));
}
