//! Feature engineering for daily price series.

pub mod builder;

pub use builder::{build_features, MAX_LOOKBACK, MA_WINDOWS, VOLATILITY_WINDOW};
