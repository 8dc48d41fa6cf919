//! Configuration management for services

use crate::error::{CostbookError, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub service_name: String,
    pub http_bind: SocketAddr,
    pub data_dir: PathBuf,
    pub log_level: String,
    pub json_logs: bool,
}

impl ServiceConfig {
    /// Build from an arbitrary variable source, e.g. `|key| std::env::var(key).ok()`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http_bind = match (lookup("HTTP_BIND"), lookup("PORT")) {
            (Some(bind), _) => bind
                .parse()
                .map_err(|e| CostbookError::Config(format!("Invalid HTTP_BIND: {}", e)))?,
            (None, Some(port)) => {
                let port: u16 = port
                    .parse()
                    .map_err(|e| CostbookError::Config(format!("Invalid PORT: {}", e)))?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            (None, None) => SocketAddr::from(([0, 0, 0, 0], 5000)),
        };

        Ok(Self {
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| "unknown".to_string()),
            http_bind,
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            json_logs: lookup("JSON_LOGS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.http_bind.port(), 5000);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.log_level, "info");
        assert!(config.json_logs);
    }

    #[test]
    fn test_port_override() {
        let config = ServiceConfig::from_lookup(lookup(&[("PORT", "8081")])).unwrap();
        assert_eq!(config.http_bind, "0.0.0.0:8081".parse().unwrap());
    }

    #[test]
    fn test_http_bind_wins_over_port() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("HTTP_BIND", "127.0.0.1:9000"),
            ("PORT", "8081"),
        ]))
        .unwrap();
        assert_eq!(config.http_bind, "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let err = ServiceConfig::from_lookup(lookup(&[("PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, CostbookError::Config(_)));
    }
}
