//! Batch feature builder
//!
//! Reads a CSV or JSON price file, cleans it, builds the feature table and
//! writes it as JSON records. Missing values are written as `null`.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use dotenvy::dotenv;
use pricecast::features::build_features;
use pricecast::logging;
use pricecast::services::market_data::{clean_bars, read_price_file, CleanOptions};
use serde_json::json;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "build-features", about = "Clean a price file and build model features")]
struct Args {
    /// CSV or JSON price file with Date, Close and Volume columns
    #[arg(long)]
    input: PathBuf,

    /// Destination for the JSON feature records
    #[arg(long)]
    output: PathBuf,

    /// Ticker recorded on the series
    #[arg(long)]
    ticker: Option<String>,

    /// Lower quantile for clipping Close (requires --clip-high)
    #[arg(long, requires = "clip_high")]
    clip_low: Option<f64>,

    /// Upper quantile for clipping Close (requires --clip-low)
    #[arg(long, requires = "clip_low")]
    clip_high: Option<f64>,

    /// Write a small sample input first when --input does not exist
    #[arg(long)]
    sample: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();

    let args = Args::parse();

    if !args.input.exists() {
        if !args.sample {
            return Err(format!("input file not found: {}", args.input.display()).into());
        }
        warn!(path = %args.input.display(), "Input not found, writing a sample file");
        write_sample_input(&args.input)?;
    }

    let mut options = CleanOptions::default();
    if let (Some(low), Some(high)) = (args.clip_low, args.clip_high) {
        options = options.with_clip(low, high);
    }
    options.validate()?;

    info!(path = %args.input.display(), "Reading price data");
    let records = read_price_file(&args.input)?;
    let mut series = clean_bars(records, &options)?;
    if let Some(ticker) = &args.ticker {
        series = series.with_ticker(ticker.to_uppercase());
    }

    let rows = build_features(&series);
    let complete = rows.iter().filter(|r| r.features.is_complete()).count();

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&args.output, serde_json::to_string_pretty(&rows)?)?;

    info!(
        ticker = series.ticker().unwrap_or("-"),
        rows = rows.len(),
        complete_rows = complete,
        path = %args.output.display(),
        "Wrote feature table"
    );
    Ok(())
}

fn write_sample_input(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let is_csv = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let contents = if is_csv {
        "Date,Close,Volume\n2025-01-02,100.0,12000\n2025-01-03,101.5,15000\n2025-01-06,99.8,13500\n"
            .to_string()
    } else {
        let sample = json!([
            {"Date": "2025-01-02", "Close": 100.0, "Volume": 12000},
            {"Date": "2025-01-03", "Close": 101.5, "Volume": 15000},
            {"Date": "2025-01-06", "Close": 99.8, "Volume": 13500},
        ]);
        serde_json::to_string_pretty(&sample).map_err(std::io::Error::other)?
    };
    fs::write(path, contents)
}
