//! HTTP endpoint server using Axum

use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

use crate::artifacts::ArtifactStore;
use crate::config::ServiceConfig;
use crate::features::{build_features, MAX_LOOKBACK};
use crate::metrics::Metrics;
use crate::models::features::{EngineeredRow, FeaturePayload, FeatureRow};
use crate::models::prediction::Prediction;
use crate::models::price::PriceSeriesError;
use crate::services::inference::{InferenceError, InferenceService};
use crate::services::market_data::{CsvPriceDataProvider, MarketDataError, PriceDataProvider};

pub const SERVICE_NAME: &str = "pricecast-inference";

#[derive(Clone)]
pub struct AppState {
    pub inference: Arc<InferenceService>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub price_data: Option<Arc<dyn PriceDataProvider>>,
}

impl AppState {
    pub fn new(inference: InferenceService, metrics: Arc<Metrics>) -> Self {
        Self {
            inference: Arc::new(inference),
            metrics,
            start_time: Arc::new(Instant::now()),
            price_data: None,
        }
    }

    pub fn with_price_data(mut self, provider: Arc<dyn PriceDataProvider>) -> Self {
        self.price_data = Some(provider);
        self
    }
}

/// Request failures, rendered as `{"error": {"kind": ..., "message": ...}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    UpstreamData(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::UpstreamData(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::NotFound(_) => "not_found",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::UpstreamData(_) => "upstream_data_error",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(kind = self.kind(), error = %self, "Request failed");
        }
        let body = json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::InvalidInput(_) => ApiError::InvalidInput(err.to_string()),
            InferenceError::ServiceUnavailable(_) => ApiError::ServiceUnavailable(err.to_string()),
            InferenceError::ModelOutput(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<MarketDataError> for ApiError {
    fn from(err: MarketDataError) -> Self {
        match err {
            MarketDataError::InvalidTicker(_) => ApiError::InvalidInput(err.to_string()),
            MarketDataError::NotFound(_)
            | MarketDataError::InvalidSeries(PriceSeriesError::Empty) => {
                ApiError::NotFound(err.to_string())
            }
            MarketDataError::Upstream { .. }
            | MarketDataError::Io { .. }
            | MarketDataError::Parse(_)
            | MarketDataError::InvalidSeries(_) => ApiError::UpstreamData(err.to_string()),
            MarketDataError::InvalidOptions(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let status = state.inference.status();
    let uptime_seconds = state.start_time.elapsed().as_secs();
    let mut body = json!({
        "status": if status.is_ready() { "ok" } else { "degraded" },
        "model_loaded": status.is_ready(),
        "features_loaded": status.is_ready(),
        "uptime_seconds": uptime_seconds,
        "service": SERVICE_NAME,
    });
    if let Ok(context) = state.inference.context() {
        body["threshold"] = json!(context.meta().threshold());
    }
    if let Some(reason) = state.inference.degraded_reason() {
        body["reason"] = json!(reason);
    }
    Json(body)
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: FeaturePayload,
}

/// Predict from a client-supplied feature vector or name map.
async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
    // Availability is reported ahead of payload errors.
    if let Err(e) = state.inference.context() {
        state.metrics.record_outcome("unavailable");
        return Err(e.into());
    }

    let Json(request) = payload.map_err(|rejection| {
        state.metrics.record_outcome("rejected");
        ApiError::from(rejection)
    })?;

    match state.inference.predict(request.features) {
        Ok(prediction) => {
            state.metrics.record_prediction(&prediction);
            Ok(Json(prediction))
        }
        Err(e) => {
            state.metrics.record_outcome(match e {
                InferenceError::InvalidInput(_) => "rejected",
                InferenceError::ServiceUnavailable(_) => "unavailable",
                InferenceError::ModelOutput(_) => "error",
            });
            Err(e.into())
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeaturesQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct FeaturesResponse {
    ticker: String,
    rows: usize,
    features: Vec<EngineeredRow>,
}

#[derive(Debug, Serialize)]
struct TickerPrediction {
    ticker: String,
    date: NaiveDate,
    #[serde(flatten)]
    prediction: Prediction,
    features: FeatureRow,
}

/// Engineered feature rows for a locally stored ticker.
async fn ticker_features(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<FeaturesQuery>,
) -> Result<Json<FeaturesResponse>, ApiError> {
    let (ticker, mut rows) = load_features(&state, ticker).await?;
    let total = rows.len();
    if let Some(limit) = query.limit {
        rows = rows.split_off(total.saturating_sub(limit));
    }
    Ok(Json(FeaturesResponse {
        ticker,
        rows: total,
        features: rows,
    }))
}

/// Run the full pipeline on the latest bar of a ticker.
async fn predict_ticker(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<TickerPrediction>, ApiError> {
    state.inference.context()?;

    let (ticker, rows) = load_features(&state, ticker).await?;
    let latest = rows
        .last()
        .ok_or_else(|| ApiError::NotFound(format!("no price data for {}", ticker)))?;

    if rows.len() <= MAX_LOOKBACK {
        warn!(
            ticker = %ticker,
            rows = rows.len(),
            "Series shorter than the feature lookback, missing features are imputed"
        );
    }

    let prediction = state.inference.predict_row(&latest.features)?;
    state.metrics.record_prediction(&prediction);

    Ok(Json(TickerPrediction {
        ticker,
        date: latest.date,
        prediction,
        features: latest.features,
    }))
}

async fn load_features(
    state: &AppState,
    ticker: String,
) -> Result<(String, Vec<EngineeredRow>), ApiError> {
    let provider = state.price_data.clone().ok_or_else(|| {
        ApiError::ServiceUnavailable("price data provider is not configured".to_string())
    })?;

    let series = tokio::task::spawn_blocking(move || provider.fetch_series(&ticker))
        .await
        .map_err(|e| ApiError::Internal(format!("price data task failed: {}", e)))??;

    let ticker = series.ticker().unwrap_or_default().to_string();
    Ok((ticker, build_features(&series)))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/predict", post(predict))
        .route("/predict/{ticker}", get(predict_ticker))
        .route("/features/{ticker}", get(ticker_features))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Build the application state from configuration. Artifact or data
/// directory problems degrade the service but never fail startup.
pub fn build_state(config: &ServiceConfig) -> Result<AppState, prometheus::Error> {
    let metrics = Arc::new(Metrics::new()?);
    let inference = InferenceService::start(&ArtifactStore::new(&config.artifact_dir));
    let state = AppState::new(inference, metrics);

    if config.data_dir.is_dir() {
        info!(data_dir = %config.data_dir.display(), "Price data provider enabled");
        Ok(state.with_price_data(Arc::new(CsvPriceDataProvider::new(&config.data_dir))))
    } else {
        warn!(
            data_dir = %config.data_dir.display(),
            "Price data directory not found - ticker endpoints will be unavailable"
        );
        Ok(state)
    }
}

pub async fn start_server(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(&config)?;
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!(port = config.port, "HTTP server listening on port {}", config.port);
    axum::serve(listener, app).await?;

    Ok(())
}
