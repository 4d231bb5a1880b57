//! Price data loading, cleaning and the provider interface used by the
//! ticker endpoints.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::common::math;
use crate::models::price::{PriceBar, PriceSeries, PriceSeriesError};

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("invalid ticker '{0}'")]
    InvalidTicker(String),

    #[error("no price data for {0}")]
    NotFound(String),

    /// The price source failed; not retried automatically.
    #[error("failed to load price data for {ticker}: {reason}")]
    Upstream { ticker: String, reason: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse price data: {0}")]
    Parse(String),

    #[error("invalid cleaning options: {0}")]
    InvalidOptions(String),

    #[error(transparent)]
    InvalidSeries(#[from] PriceSeriesError),
}

pub trait PriceDataProvider: Send + Sync {
    /// Cleaned, ascending series for a ticker.
    fn fetch_series(&self, ticker: &str) -> Result<PriceSeries, MarketDataError>;
}

/// One raw row as found in a CSV or JSON price file. Every value is optional
/// so that incomplete rows can be dropped by [`clean_bars`] instead of
/// failing the whole file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceRecord {
    #[serde(rename = "Date", alias = "date")]
    pub date: String,
    #[serde(rename = "Open", alias = "open", default)]
    pub open: Option<f64>,
    #[serde(rename = "High", alias = "high", default)]
    pub high: Option<f64>,
    #[serde(rename = "Low", alias = "low", default)]
    pub low: Option<f64>,
    #[serde(rename = "Close", alias = "close")]
    pub close: Option<f64>,
    #[serde(rename = "Volume", alias = "volume")]
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CleanOptions {
    /// Clip Close to these lower/upper quantiles.
    pub clip_quantiles: Option<(f64, f64)>,
}

impl CleanOptions {
    pub fn with_clip(mut self, low: f64, high: f64) -> Self {
        self.clip_quantiles = Some((low, high));
        self
    }

    /// Clip quantiles must lie in `[0, 1]` with `low <= high`.
    pub fn validate(&self) -> Result<(), MarketDataError> {
        match self.clip_quantiles {
            Some((low, high))
                if !(0.0..=1.0).contains(&low) || !(0.0..=1.0).contains(&high) || low > high =>
            {
                Err(MarketDataError::InvalidOptions(format!(
                    "clip quantiles {}..{} must satisfy 0 <= low <= high <= 1",
                    low, high
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Read price records from `.csv`, or from a JSON array of records for any
/// other extension.
pub fn read_price_file(path: &Path) -> Result<Vec<PriceRecord>, MarketDataError> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| MarketDataError::Parse(format!("{}: {}", path.display(), e)))?;
        reader
            .deserialize()
            .collect::<Result<Vec<PriceRecord>, _>>()
            .map_err(|e| MarketDataError::Parse(format!("{}: {}", path.display(), e)))
    } else {
        let json = std::fs::read_to_string(path).map_err(|e| MarketDataError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json)
            .map_err(|e| MarketDataError::Parse(format!("{}: {}", path.display(), e)))
    }
}

/// Drop rows with an unparseable date, sort by date and keep the first row
/// of each date, then drop rows whose Close/Volume is missing or non-finite.
/// Close is optionally clipped to quantile bounds.
pub fn clean_bars(
    records: Vec<PriceRecord>,
    options: &CleanOptions,
) -> Result<PriceSeries, MarketDataError> {
    options.validate()?;
    let before = records.len();

    let mut dated: Vec<(NaiveDate, PriceRecord)> = records
        .into_iter()
        .filter_map(|r| Some((parse_date(&r.date)?, r)))
        .collect();
    dated.sort_by_key(|(date, _)| *date);
    dated.dedup_by_key(|(date, _)| *date);

    let mut bars: Vec<PriceBar> = dated
        .into_iter()
        .filter_map(|(date, r)| {
            let close = r.close.and_then(math::finite)?;
            let volume = r.volume.and_then(math::finite)?;
            Some(PriceBar {
                date,
                open: r.open.and_then(math::finite),
                high: r.high.and_then(math::finite),
                low: r.low.and_then(math::finite),
                close,
                volume,
            })
        })
        .collect();

    if bars.is_empty() {
        return Err(PriceSeriesError::Empty.into());
    }

    if let Some((low, high)) = options.clip_quantiles {
        let mut closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        closes.sort_by(|a, b| a.total_cmp(b));
        if let (Some(lo), Some(hi)) = (
            math::quantile_sorted(&closes, low),
            math::quantile_sorted(&closes, high),
        ) {
            for bar in &mut bars {
                bar.close = bar.close.max(lo).min(hi);
            }
            debug!(low = lo, high = hi, "Clipped Close to quantile bounds");
        }
    }

    info!(rows_before = before, rows_after = bars.len(), "Cleaned price data");
    Ok(PriceSeries::new(bars)?)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d").ok()
}

/// Reads `<data_dir>/<TICKER>.csv`.
pub struct CsvPriceDataProvider {
    data_dir: PathBuf,
    options: CleanOptions,
}

impl CsvPriceDataProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            options: CleanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CleanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl PriceDataProvider for CsvPriceDataProvider {
    fn fetch_series(&self, ticker: &str) -> Result<PriceSeries, MarketDataError> {
        let ticker = normalize_ticker(ticker)?;
        let path = self.data_dir.join(format!("{}.csv", ticker));
        if !path.exists() {
            return Err(MarketDataError::NotFound(ticker));
        }

        let records = read_price_file(&path).map_err(|e| MarketDataError::Upstream {
            ticker: ticker.clone(),
            reason: e.to_string(),
        })?;
        let series = match clean_bars(records, &self.options) {
            Ok(series) => series,
            Err(MarketDataError::InvalidSeries(PriceSeriesError::Empty)) => {
                return Err(MarketDataError::NotFound(ticker))
            }
            Err(e) => return Err(e),
        };

        debug!(ticker = %ticker, rows = series.len(), "Loaded price series");
        Ok(series.with_ticker(ticker))
    }
}

/// Upper-case and restrict to characters that cannot escape the data
/// directory.
pub fn normalize_ticker(ticker: &str) -> Result<String, MarketDataError> {
    let normalized = ticker.trim().to_ascii_uppercase();
    let valid = !normalized.is_empty()
        && normalized.len() <= 16
        && !normalized.starts_with('.')
        && normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if valid {
        Ok(normalized)
    } else {
        Err(MarketDataError::InvalidTicker(ticker.to_string()))
    }
}
