//! Costbook Core - Shared service infrastructure
//!
//! This crate provides:
//! - Standard service trait every Costbook service implements
//! - Error handling utilities
//! - Configuration management

pub mod config;
pub mod error;
pub mod service;

pub use config::ServiceConfig;
pub use error::{CostbookError, Result};
pub use service::{CostbookService, DependencyStatus, HealthStatus, MicroserviceRuntime, ReadinessStatus};
