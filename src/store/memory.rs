use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{KeyValueStore, Record};

/// Process-local store. Used in tests and as the fallback when the
/// database cannot be opened.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: Record) -> Self {
        Self {
            data: Mutex::new(record),
        }
    }

    /// Copy of everything currently stored.
    pub fn dump(&self) -> Record {
        match self.data.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Record> {
        let guard = self
            .data
            .lock()
            .map_err(|err| anyhow!("memory store lock poisoned: {err}"))?;
        Ok(keys
            .iter()
            .filter_map(|key| guard.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect())
    }

    async fn set(&self, items: Record) -> Result<()> {
        let mut guard = self
            .data
            .lock()
            .map_err(|err| anyhow!("memory store lock poisoned: {err}"))?;
        guard.extend(items);
        Ok(())
    }
}
