//! Costing Service binary

use std::sync::Arc;

use anyhow::Context;
use costbook_core::MicroserviceRuntime;
use costbook_telemetry::TelemetryConfig;
use costing_service::{CostingConfig, CostingService};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CostingConfig::from_env().context("invalid configuration")?;

    costbook_telemetry::init_tracing(&TelemetryConfig {
        service_name: config.service.service_name.clone(),
        log_level: config.service.log_level.clone(),
        json_logs: config.service.json_logs,
    })
    .context("failed to initialize logging")?;

    info!(data_dir = %config.service.data_dir.display(), "Starting Costing Service");

    let service = Arc::new(CostingService::new(config));
    MicroserviceRuntime::run(service)
        .await
        .context("costing service terminated with an error")
}
