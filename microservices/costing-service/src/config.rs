//! Costing Service configuration

use std::path::PathBuf;
use std::str::FromStr;

use costbook_core::{CostbookError, Result, ServiceConfig};

use crate::store::{ConfigurationStore, IdAllocation};

pub const SERVICE_NAME: &str = "costing-service";

/// Where configurations are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    /// `<DATA_DIR>/configurations.json`
    #[default]
    File,
    /// Process memory only
    Memory,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(Self::File),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("unknown storage kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CostingConfig {
    pub service: ServiceConfig,
    pub storage: StorageKind,
    pub id_allocation: IdAllocation,
}

impl CostingConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut service = ServiceConfig::from_lookup(&lookup)?;
        if lookup("SERVICE_NAME").is_none() {
            service.service_name = SERVICE_NAME.to_string();
        }

        let storage = match lookup("STORAGE") {
            Some(raw) => raw
                .parse()
                .map_err(|e| CostbookError::Config(format!("Invalid STORAGE: {}", e)))?,
            None => StorageKind::default(),
        };

        let id_allocation = match lookup("ID_ALLOCATION") {
            Some(raw) => raw
                .parse()
                .map_err(|e| CostbookError::Config(format!("Invalid ID_ALLOCATION: {}", e)))?,
            None => IdAllocation::default(),
        };

        Ok(Self {
            service,
            storage,
            id_allocation,
        })
    }

    pub fn configurations_file(&self) -> PathBuf {
        self.service.data_dir.join(crate::store::JsonFileBackend::FILE_NAME)
    }

    pub fn open_store(&self) -> ConfigurationStore {
        match self.storage {
            StorageKind::File => ConfigurationStore::json_file(&self.service.data_dir, self.id_allocation),
            StorageKind::Memory => ConfigurationStore::new(
                std::sync::Arc::new(crate::store::MemoryBackend::new()),
                self.id_allocation,
            ),
        }
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
        let config = CostingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.service.service_name, SERVICE_NAME);
        assert_eq!(config.storage, StorageKind::File);
        assert_eq!(config.id_allocation, IdAllocation::NextMax);
        assert_eq!(config.configurations_file(), PathBuf::from("data/configurations.json"));
    }

    #[test]
    fn test_overrides() {
        let config = CostingConfig::from_lookup(lookup(&[
            ("STORAGE", "memory"),
            ("ID_ALLOCATION", "count"),
            ("DATA_DIR", "/var/lib/costbook"),
            ("SERVICE_NAME", "costing-eu"),
        ]))
        .unwrap();

        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.id_allocation, IdAllocation::Count);
        assert_eq!(config.service.service_name, "costing-eu");
        assert_eq!(
            config.configurations_file(),
            PathBuf::from("/var/lib/costbook/configurations.json")
        );
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let err = CostingConfig::from_lookup(lookup(&[("STORAGE", "s3")])).unwrap_err();
        assert!(matches!(err, CostbookError::Config(_)));

        let err = CostingConfig::from_lookup(lookup(&[("ID_ALLOCATION", "uuid")])).unwrap_err();
        assert!(matches!(err, CostbookError::Config(_)));
    }

    #[test]
    fn test_memory_store_opens_empty() {
        let config = CostingConfig::from_lookup(lookup(&[("STORAGE", "memory")])).unwrap();
        let store = config.open_store();
        assert_eq!(store.location(), "memory");
        assert_eq!(store.count().unwrap(), 0);
    }
}
