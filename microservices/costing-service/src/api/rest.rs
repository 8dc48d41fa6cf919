//! Costing REST API

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use costbook_core::{DependencyStatus, ReadinessStatus};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::calculator::CostCalculator;
use crate::error::{ApiError, ApiResult};
use crate::metrics::{ServiceMetrics, StatsSnapshot};
use crate::store::{ConfigurationStore, StoreResult};
use crate::types::{
    CalculationResult, CategoryInfo, Configuration, ConfigurationId, CostCategory, StoredConfiguration,
};

#[derive(Clone)]
pub struct AppState {
    pub store: ConfigurationStore,
    pub metrics: ServiceMetrics,
    pub service_name: Arc<str>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: ConfigurationStore, service_name: &str) -> Self {
        Self {
            store,
            metrics: ServiceMetrics::new(),
            service_name: Arc::from(service_name),
            start_time: Instant::now(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/stats", get(stats))
        // Configurations
        .route("/api/configurations", get(list_configurations))
        .route("/api/configuration", post(save_configuration))
        .route(
            "/api/configuration/{id}",
            get(get_configuration).delete(delete_configuration),
        )
        // Calculation
        .route("/api/calculate", post(calculate))
        .route("/api/categories", get(list_categories))
        .with_state(state)
}

/// Run a store operation off the async workers; the store does blocking file I/O.
async fn blocking<T, F>(op: F) -> ApiResult<T>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

/// Ids that are not non-negative integers cannot name a configuration
fn configuration_id(id: Result<Path<ConfigurationId>, PathRejection>) -> ApiResult<ConfigurationId> {
    id.map(|Path(id)| id).map_err(|_| ApiError::NotFound)
}

// Health endpoints

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: String,
    version: &'static str,
    uptime_seconds: u64,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: state.service_name.to_string(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessStatus>) {
    let status = storage_readiness(&state.store).await;
    let code = if status.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// Probe the backend with a full load
pub async fn storage_readiness(store: &ConfigurationStore) -> ReadinessStatus {
    let probe = store.clone();
    let started = Instant::now();
    let available = matches!(tokio::task::spawn_blocking(move || probe.count()).await, Ok(Ok(_)));

    ReadinessStatus {
        ready: available,
        dependencies: vec![DependencyStatus {
            name: store.location(),
            available,
            latency_ms: Some(started.elapsed().as_millis() as u64),
        }],
    }
}

async fn stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.metrics.snapshot())
}

// Configuration endpoints

async fn list_configurations(State(state): State<AppState>) -> ApiResult<Json<Vec<StoredConfiguration>>> {
    let store = state.store.clone();
    let records = blocking(move || store.list()).await?;

    state.metrics.configurations_stored.set(records.len() as u64);
    Ok(Json(records))
}

async fn get_configuration(
    State(state): State<AppState>,
    id: Result<Path<ConfigurationId>, PathRejection>,
) -> ApiResult<Json<StoredConfiguration>> {
    let id = configuration_id(id)?;
    let store = state.store.clone();
    let record = blocking(move || store.get(id)).await?;
    Ok(Json(record))
}

async fn save_configuration(
    State(state): State<AppState>,
    body: Result<Json<Configuration>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Json(configuration) = body?;

    let store = state.store.clone();
    let saved = blocking(move || store.save(configuration)).await?;

    state.metrics.configurations_saved.inc();
    state.metrics.configurations_stored.set(saved.stored as u64);

    Ok(Json(json!({
        "success": true,
        "message": "Configuration saved",
        "id": saved.id
    })))
}

async fn delete_configuration(
    State(state): State<AppState>,
    id: Result<Path<ConfigurationId>, PathRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    // Unparseable ids match nothing, which is the same no-op as an unknown id
    let Ok(Path(id)) = id else {
        debug!("Delete with non-numeric id ignored");
        return Ok(deleted());
    };

    let store = state.store.clone();
    let deleted_records = blocking(move || store.delete(id)).await?;

    state.metrics.configurations_deleted.add(deleted_records.removed as u64);
    state.metrics.configurations_stored.set(deleted_records.remaining as u64);

    Ok(deleted())
}

fn deleted() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "Configuration deleted"
    }))
}

// Calculation endpoints

async fn calculate(
    State(state): State<AppState>,
    body: Result<Json<Configuration>, JsonRejection>,
) -> ApiResult<Json<CalculationResult>> {
    let Json(configuration) = body?;

    let started = Instant::now();
    let result = CostCalculator::calculate(&configuration)?;
    state
        .metrics
        .calculation_latency_us
        .record(started.elapsed().as_secs_f64() * 1_000_000.0);
    state.metrics.calculations.inc();

    info!(
        total_cost = result.total_cost,
        unit_cost = result.unit_cost,
        margin_percent = result.margin_percent,
        "Calculation completed"
    );

    Ok(Json(result))
}

async fn list_categories() -> Json<Vec<CategoryInfo>> {
    Json(CostCategory::ALL.into_iter().map(CategoryInfo::from).collect())
}
