//! Configuration persistence

mod backend;
mod error;
mod service;

pub use backend::{ConfigurationBackend, JsonFileBackend, MemoryBackend};
pub use error::{StoreError, StoreResult};
pub use service::{ConfigurationStore, Deleted, IdAllocation, Saved};
