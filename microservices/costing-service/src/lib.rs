//! Costing Service
//!
//! Product costing for small producers:
//! - Durable storage of cost configurations (line items grouped by category)
//! - Unit economics: totals, unit cost, profit and margin per unit and per batch
//! - REST API over both

pub mod api;
pub mod calculator;
pub mod config;
pub mod error;
pub mod metrics;
pub mod store;
pub mod types;


use async_trait::async_trait;
use costbook_core::{CostbookError, CostbookService, HealthStatus, ReadinessStatus, Result};
use tracing::info;

pub use api::rest::{create_router, AppState};
pub use calculator::CostCalculator;
pub use config::{CostingConfig, StorageKind};
pub use store::{ConfigurationStore, IdAllocation};
pub use types::*;

pub struct CostingService {
    config: CostingConfig,
    state: AppState,
}

impl CostingService {
    pub fn new(config: CostingConfig) -> Self {
        let store = config.open_store();
        let state = AppState::new(store, &config.service.service_name);
        Self { config, state }
    }
}

#[async_trait]
impl CostbookService for CostingService {
    fn service_id(&self) -> &'static str {
        config::SERVICE_NAME
    }

    async fn health(&self) -> HealthStatus {
        HealthStatus {
            healthy: true,
            service_id: self.service_id().to_string(),
            version: self.version().to_string(),
            uptime_seconds: self.state.start_time.elapsed().as_secs(),
        }
    }

    async fn ready(&self) -> ReadinessStatus {
        api::rest::storage_readiness(&self.state.store).await
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down Costing Service");
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        info!(
            http = %self.config.service.http_bind,
            storage = %self.state.store.location(),
            id_allocation = ?self.config.id_allocation,
            "Starting Costing server"
        );

        let router = create_router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(self.config.service.http_bind).await?;
        axum::serve(listener, router)
            .await
            .map_err(|e| CostbookError::Internal(format!("HTTP server failed: {}", e)))?;

        Ok(())
    }
}
