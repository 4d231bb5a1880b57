//! Shared data models spanning the pipeline layers.

pub mod features;
pub mod prediction;
pub mod price;

pub use features::{
    EngineeredRow, FeaturePayload, FeatureRow, FeatureSchemaError, FEATURE_COLUMNS, FEATURE_COUNT,
};
pub use prediction::Prediction;
pub use price::{PriceBar, PriceSeries, PriceSeriesError};
