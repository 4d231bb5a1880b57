//! Technical features and next-day direction label.
//!
//! Output rows are aligned 1:1 with the input bars. Rows without enough
//! history carry `None` for the longer windows; that is expected, not an
//! error.

use crate::common::math::{self, finite};
use crate::models::features::{EngineeredRow, FeatureRow};
use crate::models::price::PriceSeries;

/// Simple moving average windows over Close.
pub const MA_WINDOWS: [usize; 3] = [5, 10, 20];

/// Window of the return standard deviation.
pub const VOLATILITY_WINDOW: usize = 20;

/// Rows of history before every feature can be defined: the longest of the
/// moving-average and volatility windows.
pub const MAX_LOOKBACK: usize = max_window();

const fn max_window() -> usize {
    let mut longest = VOLATILITY_WINDOW;
    let mut i = 0;
    while i < MA_WINDOWS.len() {
        if MA_WINDOWS[i] > longest {
            longest = MA_WINDOWS[i];
        }
        i += 1;
    }
    longest
}

/// Build the feature table for a price series.
///
/// - `Return[t] = Close[t] / Close[t-1] - 1`
/// - `Target[t] = 1` if `Return[t+1] > 0`, undefined on the last row
/// - `MA5`, `MA10`, `MA20`: trailing means of Close
/// - `Volatility20`: trailing sample std of Return (first defined at index 20)
/// - `Lag1`, `Lag2`: Return shifted by one and two rows
pub fn build_features(series: &PriceSeries) -> Vec<EngineeredRow> {
    let bars = series.bars();
    let closes: Vec<Option<f64>> = bars.iter().map(|b| finite(b.close)).collect();
    let returns = simple_returns(&closes);

    let [ma5, ma10, ma20] = MA_WINDOWS.map(|w| math::rolling_mean(&closes, w));
    let volatility = math::rolling_std(&returns, VOLATILITY_WINDOW);
    let lag1 = math::lag(&returns, 1);
    let lag2 = math::lag(&returns, 2);

    bars.iter()
        .enumerate()
        .map(|(t, bar)| EngineeredRow {
            date: bar.date,
            close: bar.close,
            ret: returns[t],
            target: returns
                .get(t + 1)
                .copied()
                .flatten()
                .map(|next| u8::from(next > 0.0)),
            features: FeatureRow {
                ma5: ma5[t],
                ma10: ma10[t],
                ma20: ma20[t],
                volatility20: volatility[t],
                lag1: lag1[t],
                lag2: lag2[t],
                volume: finite(bar.volume),
            },
        })
        .collect()
}

fn simple_returns(closes: &[Option<f64>]) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|t| {
            let previous = t.checked_sub(1).and_then(|p| closes[p])?;
            let current = closes[t]?;
            finite(current / previous - 1.0)
        })
        .collect()
}
