//! In-process record store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::record::{sort_records, PhotoRecord, RecordUpdate};
use super::CollectionStore;
use crate::error::{Error, Result};

/// Records kept in a map behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, PhotoRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, PhotoRecord>>> {
        self.records
            .lock()
            .map_err(|_| Error::unavailable("memory store lock poisoned"))
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<PhotoRecord>> {
        Ok(self.lock()?.get(id).cloned())
    }

    async fn create(&self, record: &PhotoRecord) -> Result<()> {
        let mut records = self.lock()?;
        if records.contains_key(&record.id) {
            return Err(Error::AlreadyExists {
                id: record.id.clone(),
            });
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn set(&self, record: &PhotoRecord) -> Result<()> {
        self.lock()?.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn update(&self, id: &str, update: &RecordUpdate) -> Result<()> {
        let mut records = self.lock()?;
        let record = records.get_mut(id).ok_or_else(|| Error::not_found(id))?;
        update.apply(record);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.lock()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(id))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.lock()?.len() as u64)
    }

    async fn list_all(&self) -> Result<Vec<PhotoRecord>> {
        let mut records: Vec<PhotoRecord> = self.lock()?.values().cloned().collect();
        sort_records(&mut records);
        Ok(records)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<PhotoRecord>> {
        let mut records: Vec<PhotoRecord> = self
            .lock()?
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        sort_records(&mut records);
        Ok(records)
    }
}
