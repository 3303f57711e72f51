//! Backing collection of photo records.
//!
//! A [`CollectionStore`] is the narrow interface the writer needs: point
//! lookup, conditional create, set, partial update, delete, count and the
//! two listings. Three backends are provided:
//!
//! - [`MemoryStore`] - process-local, for tests and dry runs
//! - [`FileStore`] - one JSON document per record in a directory
//! - [`FirestoreStore`] - Cloud Firestore over its REST API

mod file;
mod firestore;
mod memory;
mod record;

pub use file::FileStore;
pub use firestore::{
    FirestoreStore, DEFAULT_COLLECTION, FIRESTORE_BASE_URL, FIRESTORE_TOKEN_ENV,
};
pub use memory::MemoryStore;
pub use record::{row_map, sort_records, PhotoRecord, RecordUpdate};

use async_trait::async_trait;

use crate::error::Result;

/// Operations the record writer needs from the backing collection.
///
/// Implementations must give read-your-writes consistency to the caller that
/// just wrote.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Look a record up by identifier.
    async fn get(&self, id: &str) -> Result<Option<PhotoRecord>>;

    /// Whether a record is stored under `id`.
    async fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.get(id).await?.is_some())
    }

    /// Store `record` under `record.id` only if nothing is stored there yet.
    ///
    /// Fails with `AlreadyExists` otherwise.
    async fn create(&self, record: &PhotoRecord) -> Result<()>;

    /// Store `record` under `record.id`, replacing whatever was there.
    async fn set(&self, record: &PhotoRecord) -> Result<()>;

    /// Apply a partial update. Fails with `NotFound` if `id` is absent.
    async fn update(&self, id: &str, update: &RecordUpdate) -> Result<()>;

    /// Remove a record. Fails with `NotFound` if `id` is absent.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Number of stored records.
    async fn count(&self) -> Result<u64>;

    /// Every record, in insertion order.
    async fn list_all(&self) -> Result<Vec<PhotoRecord>>;

    /// Every record owned by `owner_id`, in insertion order.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<PhotoRecord>>;
}

#[async_trait]
impl<T: CollectionStore + ?Sized> CollectionStore for Box<T> {
    async fn get(&self, id: &str) -> Result<Option<PhotoRecord>> {
        (**self).get(id).await
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        (**self).contains(id).await
    }

    async fn create(&self, record: &PhotoRecord) -> Result<()> {
        (**self).create(record).await
    }

    async fn set(&self, record: &PhotoRecord) -> Result<()> {
        (**self).set(record).await
    }

    async fn update(&self, id: &str, update: &RecordUpdate) -> Result<()> {
        (**self).update(id, update).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id).await
    }

    async fn count(&self) -> Result<u64> {
        (**self).count().await
    }

    async fn list_all(&self) -> Result<Vec<PhotoRecord>> {
        (**self).list_all().await
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<PhotoRecord>> {
        (**self).list_by_owner(owner_id).await
    }
}
