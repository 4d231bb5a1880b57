//! Tracing subscriber setup shared by the binaries.
//!
//! JSON lines in production, coloured human-readable output elsewhere.
//! `LOG_FORMAT=json|pretty` forces one or the other.

use crate::config::{get_environment, is_production_environment};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// `LOG_FORMAT` if set, otherwise JSON for production environments.
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").ok().as_deref().map(str::trim) {
            Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            _ if is_production_environment(&get_environment()) => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
/// Calling it twice keeps the first subscriber.
pub fn init_logging() {
    let format = LogFormat::from_env();
    let default_filter = match format {
        LogFormat::Json => "info",
        LogFormat::Pretty => "info,pricecast=debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stdout),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Logging already initialized");
    }
}
