//! Pricecast API Server
//!
//! Serves `/health`, `/metrics`, `/predict` and the ticker feature endpoints.
//! A missing or broken artifact bundle starts the server in degraded mode.

use dotenvy::dotenv;
use pricecast::config::ServiceConfig;
use pricecast::core::http::start_server;
use pricecast::logging;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let config = ServiceConfig::from_env();
    info!("Starting Pricecast API Server");
    info!(
        environment = %config.environment,
        production = config.is_production(),
        "Environment"
    );
    info!(artifact_dir = %config.artifact_dir.display(), "Artifact bundle");
    info!(port = config.port, "HTTP Server: http://0.0.0.0:{}", config.port);

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
        }
        result = start_server(config) => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server error");
                return Err(e);
            }
            error!("HTTP server stopped");
        }
    }

    Ok(())
}
