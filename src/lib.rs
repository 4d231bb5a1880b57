//! Pricecast: technical-indicator features and model serving for daily price data.
//!
//! Raw OHLCV series are turned into a fixed feature schema by [`features`],
//! a fitted model bundle is persisted and restored by [`artifacts`], and
//! [`services::inference`] serves predictions behind the HTTP layer in
//! [`core::http`].

pub mod artifacts;
pub mod common;
pub mod config;
pub mod core;
pub mod features;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
