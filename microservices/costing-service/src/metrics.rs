//! Service counters exposed on `/stats`

use costbook_telemetry::{Counter, Gauge, Histogram};
use serde::Serialize;

#[derive(Clone)]
pub struct ServiceMetrics {
    pub calculations: Counter,
    pub configurations_saved: Counter,
    pub configurations_deleted: Counter,
    pub configurations_stored: Gauge,
    pub calculation_latency_us: Histogram,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub calculations: u64,
    pub configurations_saved: u64,
    pub configurations_deleted: u64,
    pub configurations_stored: u64,
    pub mean_calculation_latency_us: f64,
    pub p99_calculation_latency_us: f64,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            calculations: Counter::new("calculations_total"),
            configurations_saved: Counter::new("configurations_saved_total"),
            configurations_deleted: Counter::new("configurations_deleted_total"),
            configurations_stored: Gauge::new("configurations_stored"),
            calculation_latency_us: Histogram::with_capacity("calculation_latency_us", 4096),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            calculations: self.calculations.get(),
            configurations_saved: self.configurations_saved.get(),
            configurations_deleted: self.configurations_deleted.get(),
            configurations_stored: self.configurations_stored.get(),
            mean_calculation_latency_us: self.calculation_latency_us.mean(),
            p99_calculation_latency_us: self.calculation_latency_us.percentile(99.0),
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}
