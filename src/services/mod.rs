//! Services consumed by the HTTP layer and the batch tools.

pub mod inference;
pub mod market_data;

pub use inference::{InferenceError, InferenceService, ModelContext, ServiceStatus};
pub use market_data::{
    clean_bars, read_price_file, CleanOptions, CsvPriceDataProvider, MarketDataError,
    PriceDataProvider, PriceRecord,
};
