//! Committing rendered grids to the collection.

use chrono::Utc;

use crate::allocator::IdAllocator;
use crate::ascii::GlyphGrid;
use crate::error::{Error, Result};
use crate::store::{CollectionStore, PhotoRecord, RecordUpdate};

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub id: String,
    pub order_number: u64,
}

/// Writes new records under freshly allocated identifiers and manages
/// existing ones.
///
/// Allocation and commit are separate round trips. The commit uses the
/// store's conditional create, so two writers racing for the same identifier
/// cannot overwrite each other: the loser draws a new identifier, spending
/// one attempt of the allocator's budget. `order_number` is read from the
/// collection size just before the commit and is only advisory when several
/// writers share a collection.
pub struct RecordWriter<S> {
    store: S,
    allocator: IdAllocator,
}

impl<S: CollectionStore> RecordWriter<S> {
    pub fn new(store: S) -> Self {
        Self::with_allocator(store, IdAllocator::default())
    }

    pub fn with_allocator(store: S, allocator: IdAllocator) -> Self {
        Self { store, allocator }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persist a rendered grid for `owner_id` and return its identifier.
    pub async fn write(&self, owner_id: &str, grid: &GlyphGrid) -> Result<String> {
        self.write_tokens(owner_id, grid.to_tokens())
            .await
            .map(|receipt| receipt.id)
    }

    /// Persist already tokenized rows for `owner_id`.
    pub async fn write_tokens(
        &self,
        owner_id: &str,
        raw_image: Vec<Vec<String>>,
    ) -> Result<WriteReceipt> {
        let max_attempts = self.allocator.max_attempts();
        let mut remaining = max_attempts;

        while remaining > 0 {
            let budget = IdAllocator::new(remaining);
            let mut drawn = 0;
            let id = budget
                .allocate_async(|candidate| {
                    drawn += 1;
                    async move { self.store.contains(&candidate).await }
                })
                .await
                .map_err(|e| match e {
                    Error::AllocationExhausted { .. } => Error::AllocationExhausted {
                        attempts: max_attempts,
                    },
                    other => other,
                })?;
            remaining -= drawn;

            let order_number = self.store.count().await?;
            let record = PhotoRecord {
                id,
                owner_id: owner_id.to_string(),
                raw_image: raw_image.clone(),
                order_number,
                created_at: Utc::now(),
            };

            match self.store.create(&record).await {
                Ok(()) => {
                    log::info!(
                        "Stored record {} for owner {} (order {})",
                        record.id,
                        owner_id,
                        order_number
                    );
                    return Ok(WriteReceipt {
                        id: record.id,
                        order_number,
                    });
                }
                Err(Error::AlreadyExists { id }) => {
                    log::warn!("Identifier {} was taken before commit, drawing again", id);
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::AllocationExhausted {
            attempts: max_attempts,
        })
    }

    pub async fn get(&self, id: &str) -> Result<PhotoRecord> {
        self.store.get(id).await?.ok_or_else(|| Error::not_found(id))
    }

    pub async fn fetch_all(&self) -> Result<Vec<PhotoRecord>> {
        self.store.list_all().await
    }

    pub async fn fetch_owner(&self, owner_id: &str) -> Result<Vec<PhotoRecord>> {
        self.store.list_by_owner(owner_id).await
    }

    /// Update one record. Fails with `NotFound` if it does not exist.
    pub async fn update(&self, id: &str, update: &RecordUpdate) -> Result<()> {
        self.store.update(id, update).await?;
        log::info!("Updated record {} ({:?})", id, update.field_paths());
        Ok(())
    }

    /// Update every record of `owner_id`. Returns how many were updated.
    pub async fn update_owner(&self, owner_id: &str, update: &RecordUpdate) -> Result<usize> {
        let records = self.store.list_by_owner(owner_id).await?;
        for record in &records {
            self.store.update(&record.id, update).await?;
        }
        log::info!("Updated {} record(s) of owner {}", records.len(), owner_id);
        Ok(records.len())
    }

    /// Delete one record. Fails with `NotFound` if it does not exist.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(id).await?;
        log::info!("Deleted record {}", id);
        Ok(())
    }
}
