//! Daily OHLCV bars and validated price series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriceSeriesError {
    #[error("bars must be strictly ascending by date: {previous} is followed by {next} at row {index}")]
    Unordered {
        index: usize,
        previous: NaiveDate,
        next: NaiveDate,
    },

    #[error("price series has no usable rows")]
    Empty,
}

/// One daily bar. Open/High/Low are optional since only Close and Volume
/// feed the feature set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    #[serde(rename = "Date", with = "iso_date")]
    pub date: NaiveDate,
    #[serde(rename = "Open", default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(rename = "High", default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(rename = "Low", default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, close: f64, volume: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume,
        }
    }

    pub fn with_ohl(mut self, open: f64, high: f64, low: f64) -> Self {
        self.open = Some(open);
        self.high = Some(high);
        self.low = Some(low);
        self
    }
}

/// Bars for a single ticker, strictly ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    ticker: Option<String>,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Validate ordering; duplicated dates count as unordered.
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, PriceSeriesError> {
        if let Some(index) = bars.windows(2).position(|w| w[0].date >= w[1].date) {
            return Err(PriceSeriesError::Unordered {
                index: index + 1,
                previous: bars[index].date,
                next: bars[index + 1].date,
            });
        }
        Ok(Self { ticker: None, bars })
    }

    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    pub fn ticker(&self) -> Option<&str> {
        self.ticker.as_deref()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// `YYYY-MM-DD`, tolerating a trailing time component on input
/// (`2025-01-02T00:00:00.000`, `2025-01-02 00:00:00-05:00`).
pub(crate) mod iso_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let day = raw.trim().get(..10).unwrap_or(raw.trim());
        NaiveDate::parse_from_str(day, FORMAT)
            .map_err(|e| de::Error::custom(format!("invalid date '{}': {}", raw, e)))
    }
}
