//! Rolling-window statistics over series with missing values.
//!
//! Missing entries are `None`. A window yields a value only when it is full
//! and every entry in it is present.

/// Keep finite values, map NaN and ±inf to `None`.
pub fn finite(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    finite(variance.sqrt())
}

/// Median of the given values, `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    quantile_sorted(&sorted, 0.5)
}

/// Quantile with linear interpolation between closest ranks.
///
/// `sorted` must be in ascending order; `q` is clamped to `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    finite(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Trailing mean over `window` entries.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, mean)
}

/// Trailing sample standard deviation over `window` entries.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, sample_std)
}

/// Shift a series forward by `periods`, padding the head with `None`.
pub fn lag(values: &[Option<f64>], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| i.checked_sub(periods).and_then(|j| values[j]))
        .collect()
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn rolling<F>(values: &[Option<f64>], window: usize, stat: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = Vec::with_capacity(values.len());
    let mut buffer = Vec::with_capacity(window);

    for end in 0..values.len() {
        if window == 0 || end + 1 < window {
            out.push(None);
            continue;
        }

        buffer.clear();
        buffer.extend(values[end + 1 - window..=end].iter().map_while(|v| *v));
        if buffer.len() == window {
            out.push(stat(&buffer));
        } else {
            out.push(None);
        }
    }

    out
}
