//! Configuration Store
//!
//! Durable, ordered collection of costing configurations. Every operation is
//! a full read / mutate / full write cycle over the backend, serialized by a
//! single in-process lock.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::backend::{ConfigurationBackend, JsonFileBackend, MemoryBackend};
use super::error::{StoreError, StoreResult};
use crate::types::{Configuration, ConfigurationId, StoredConfiguration};

/// How a new record's id is derived from the current collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdAllocation {
    /// Largest existing id + 1; ids are never handed out twice
    #[default]
    NextMax,
    /// Record count + 1; reissues ids after deletions
    Count,
}

impl IdAllocation {
    pub fn next_id(&self, records: &[StoredConfiguration]) -> ConfigurationId {
        match self {
            Self::NextMax => records.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            Self::Count => records.len() as ConfigurationId + 1,
        }
    }
}

impl FromStr for IdAllocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "next-max" | "next_max" | "max" => Ok(Self::NextMax),
            "count" => Ok(Self::Count),
            other => Err(format!("unknown id allocation policy '{}'", other)),
        }
    }
}

/// Outcome of a successful save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Saved {
    pub id: ConfigurationId,
    /// Records in storage after the write
    pub stored: usize,
}

/// Outcome of a successful delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deleted {
    pub removed: usize,
    pub remaining: usize,
}

#[derive(Clone)]
pub struct ConfigurationStore {
    backend: Arc<dyn ConfigurationBackend>,
    /// Serializes read-modify-write cycles
    lock: Arc<Mutex<()>>,
    id_allocation: IdAllocation,
}

impl ConfigurationStore {
    pub fn new(backend: Arc<dyn ConfigurationBackend>, id_allocation: IdAllocation) -> Self {
        Self {
            backend,
            lock: Arc::new(Mutex::new(())),
            id_allocation,
        }
    }

    /// Store backed by `<data_dir>/configurations.json`
    pub fn json_file(data_dir: impl AsRef<std::path::Path>, id_allocation: IdAllocation) -> Self {
        Self::new(Arc::new(JsonFileBackend::in_dir(data_dir)), id_allocation)
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), IdAllocation::default())
    }

    pub fn id_allocation(&self) -> IdAllocation {
        self.id_allocation
    }

    pub fn location(&self) -> String {
        self.backend.describe()
    }

    /// All configurations in append order
    pub fn list(&self) -> StoreResult<Vec<StoredConfiguration>> {
        let _guard = self.lock.lock();
        let records = self.backend.load()?;
        debug!(count = records.len(), "Configurations listed");
        Ok(records)
    }

    /// First configuration carrying `id`
    pub fn get(&self, id: ConfigurationId) -> StoreResult<StoredConfiguration> {
        let _guard = self.lock.lock();
        self.backend
            .load()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Append a configuration, assigning its id and creation time.
    ///
    /// Any `id` / `created_at` the caller put in the body is discarded.
    pub fn save(&self, mut configuration: Configuration) -> StoreResult<Saved> {
        configuration.extra.remove("id");
        configuration.extra.remove("created_at");

        let _guard = self.lock.lock();
        let mut records = self.backend.load()?;

        let id = self.id_allocation.next_id(&records);
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        records.push(StoredConfiguration {
            id,
            created_at,
            configuration,
        });

        if let Err(e) = self.backend.persist(&records) {
            warn!(id, error = %e, "Failed to persist new configuration");
            return Err(e);
        }

        info!(id, total = records.len(), "Configuration saved");
        Ok(Saved {
            id,
            stored: records.len(),
        })
    }

    /// Remove every configuration carrying `id`.
    ///
    /// Deleting an unknown id is a no-op and leaves storage untouched.
    pub fn delete(&self, id: ConfigurationId) -> StoreResult<Deleted> {
        let _guard = self.lock.lock();
        let mut records = self.backend.load()?;

        let before = records.len();
        records.retain(|r| r.id != id);
        let removed = before - records.len();

        if removed == 0 {
            debug!(id, "Delete of unknown configuration ignored");
            return Ok(Deleted {
                removed: 0,
                remaining: before,
            });
        }

        if let Err(e) = self.backend.persist(&records) {
            warn!(id, error = %e, "Failed to persist configuration removal");
            return Err(e);
        }

        info!(id, removed, remaining = records.len(), "Configuration deleted");
        Ok(Deleted {
            removed,
            remaining: records.len(),
        })
    }

    /// Number of stored configurations; doubles as a storage health probe
    pub fn count(&self) -> StoreResult<usize> {
        let _guard = self.lock.lock();
        Ok(self.backend.load()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LineItem;
    use serde_json::json;

    /// Backend whose writes always fail, wrapping a healthy memory backend
    struct ReadOnlyBackend {
        inner: MemoryBackend,
    }

    impl ConfigurationBackend for ReadOnlyBackend {
        fn load(&self) -> StoreResult<Vec<StoredConfiguration>> {
            self.inner.load()
        }

        fn persist(&self, _records: &[StoredConfiguration]) -> StoreResult<()> {
            Err(StoreError::Backend("disk full".to_string()))
        }

        fn describe(&self) -> String {
            "read-only".to_string()
        }
    }

    fn yogurt(name: &str) -> Configuration {
        Configuration::new(100.0, 45.0)
            .with_item("raw_materials", LineItem::named("Milk", 5400.0, 1.0))
            .with_item("packaging", LineItem::named("Cup", 3.2, 100.0))
            .with_field("name", json!(name))
    }

    fn stored(id: ConfigurationId) -> StoredConfiguration {
        StoredConfiguration {
            id,
            created_at: "2024-01-01T00:00:00.000000Z".to_string(),
            configuration: yogurt(&format!("seed {}", id)),
        }
    }

    #[test]
    fn test_list_empty_store() {
        let store = ConfigurationStore::in_memory();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_sequential_ids() {
        let store = ConfigurationStore::in_memory();
        let ids: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|n| store.save(yogurt(n)).unwrap().id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let names: Vec<_> = store
            .list()
            .unwrap()
            .iter()
            .map(|r| r.configuration.name().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_save_then_get_round_trip() {
        let store = ConfigurationStore::in_memory();
        let input = yogurt("Greek 150g");

        let id = store.save(input.clone()).unwrap().id;
        let record = store.get(id).unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.configuration, input);
        assert!(chrono::DateTime::parse_from_rfc3339(&record.created_at).is_ok());

        let listed = store.list().unwrap();
        assert_eq!(listed.iter().filter(|r| r.id == id).count(), 1);
    }

    #[test]
    fn test_caller_supplied_identity_is_replaced() {
        let store = ConfigurationStore::in_memory();
        let input = yogurt("spoofed")
            .with_field("id", json!(99))
            .with_field("created_at", json!("1999-01-01T00:00:00"));

        let id = store.save(input).unwrap().id;
        let record = store.get(id).unwrap();

        assert_eq!(id, 1);
        assert_ne!(record.created_at, "1999-01-01T00:00:00");
        assert!(!record.configuration.extra.contains_key("id"));
        assert!(!record.configuration.extra.contains_key("created_at"));
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = ConfigurationStore::in_memory();
        store.save(yogurt("only")).unwrap();
        assert!(matches!(store.get(42), Err(StoreError::NotFound(42))));
    }

    #[test]
    fn test_delete_existing_removes_exactly_one() {
        let store = ConfigurationStore::in_memory();
        for name in ["a", "b", "c"] {
            store.save(yogurt(name)).unwrap();
        }

        assert_eq!(store.delete(2).unwrap(), Deleted { removed: 1, remaining: 2 });

        let ids: Vec<_> = store.list().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let store = ConfigurationStore::in_memory();
        store.save(yogurt("a")).unwrap();
        let before = store.list().unwrap();

        assert_eq!(store.delete(7).unwrap().removed, 0);
        assert_eq!(store.list().unwrap(), before);
    }

    #[test]
    fn test_delete_removes_all_duplicates() {
        let backend = MemoryBackend::with_records(vec![stored(1), stored(2), stored(1)]);
        let store = ConfigurationStore::new(Arc::new(backend), IdAllocation::NextMax);

        assert_eq!(store.delete(1).unwrap().removed, 2);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_next_max_never_reuses_ids() {
        let store = ConfigurationStore::in_memory();
        for name in ["a", "b", "c"] {
            store.save(yogurt(name)).unwrap();
        }
        store.delete(2).unwrap();

        assert_eq!(store.save(yogurt("d")).unwrap(), Saved { id: 4, stored: 3 });
    }

    #[test]
    fn test_count_policy_reissues_ids() {
        let store = ConfigurationStore::new(Arc::new(MemoryBackend::new()), IdAllocation::Count);
        for name in ["a", "b", "c"] {
            store.save(yogurt(name)).unwrap();
        }
        store.delete(2).unwrap();

        assert_eq!(store.save(yogurt("d")).unwrap().id, 3);
    }

    #[test]
    fn test_failed_save_keeps_existing_records() {
        let backend = ReadOnlyBackend {
            inner: MemoryBackend::with_records(vec![stored(1)]),
        };
        let store = ConfigurationStore::new(Arc::new(backend), IdAllocation::NextMax);

        let err = store.save(yogurt("new")).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(store.list().unwrap(), vec![stored(1)]);

        // store stays usable for reads after the failure
        assert_eq!(store.get(1).unwrap().id, 1);
    }

    #[test]
    fn test_failed_delete_reports_error() {
        let backend = ReadOnlyBackend {
            inner: MemoryBackend::with_records(vec![stored(1)]),
        };
        let store = ConfigurationStore::new(Arc::new(backend), IdAllocation::NextMax);

        assert!(store.delete(1).is_err());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let id = {
            let store = ConfigurationStore::json_file(dir.path(), IdAllocation::NextMax);
            store.save(yogurt("persisted")).unwrap().id
        };

        let reopened = ConfigurationStore::json_file(dir.path(), IdAllocation::NextMax);
        let record = reopened.get(id).unwrap();
        assert_eq!(record.configuration.name(), Some("persisted"));
    }

    #[test]
    fn test_concurrent_saves_do_not_lose_updates() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigurationStore::json_file(dir.path(), IdAllocation::NextMax);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || store.save(yogurt(&format!("worker {}", i))).unwrap().id)
            })
            .collect();

        let mut ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();

        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
        assert_eq!(store.count().unwrap(), 8);
    }

    #[test]
    fn test_id_allocation_parsing() {
        assert_eq!("next-max".parse::<IdAllocation>().unwrap(), IdAllocation::NextMax);
        assert_eq!("COUNT".parse::<IdAllocation>().unwrap(), IdAllocation::Count);
        assert!("random".parse::<IdAllocation>().is_err());
    }
}
