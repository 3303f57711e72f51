//! Directory-backed record store: one JSON document per record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::record::{sort_records, PhotoRecord, RecordUpdate};
use super::CollectionStore;
use crate::error::{Error, Result};

const RECORD_EXTENSION: &str = "json";

/// Stores each record as `<dir>/<id>.json`.
///
/// New records are written to a temporary file first and then hard-linked
/// into place; the link fails if the target exists, which makes `create` an
/// atomic conditional create and keeps half-written documents invisible.
///
/// `update` first renames the document to a private temporary name, so a
/// concurrent `delete` either removes it before the update starts (the update
/// fails with `NotFound`) or finds nothing to remove; a deleted record never
/// comes back. While an update is in flight the record is briefly absent to
/// other readers.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store over `dir`. Does not create the directory.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Create a store and make sure its directory exists.
    pub fn new_initialized(dir: PathBuf) -> Result<Self> {
        let store = Self::new(dir);
        std::fs::create_dir_all(&store.dir)?;
        Ok(store)
    }

    /// Default location: `<data_dir>/pyxpic/records`.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join("pyxpic")
            .join("records")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document for `id`, or `None` if `id` cannot be a file name.
    fn path_for(&self, id: &str) -> Option<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| self.dir.join(format!("{}.{}", id, RECORD_EXTENSION)))
    }

    fn temp_path(&self, id: &str) -> PathBuf {
        self.dir
            .join(format!(".{}.{}.tmp", id, uuid::Uuid::new_v4().simple()))
    }

    fn encode(record: &PhotoRecord) -> Result<String> {
        serde_json::to_string_pretty(record).map_err(|e| Error::Codec {
            id: record.id.clone(),
            message: e.to_string(),
        })
    }

    fn read(&self, id: &str, path: &Path) -> Result<Option<PhotoRecord>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut record: PhotoRecord = serde_json::from_str(&content).map_err(|e| Error::Codec {
            id: id.to_string(),
            message: e.to_string(),
        })?;
        record.id = id.to_string();
        Ok(Some(record))
    }

    /// Write `record` to a fresh temporary file in the store directory.
    fn write_temp(&self, record: &PhotoRecord) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let temp = self.temp_path(&record.id);
        std::fs::write(&temp, Self::encode(record)?)?;
        Ok(temp)
    }

    /// Identifiers of every stored document.
    fn ids(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        Ok(ids)
    }

    fn read_all(&self) -> Result<Vec<PhotoRecord>> {
        let mut records = Vec::new();
        for id in self.ids()? {
            let Some(path) = self.path_for(&id) else {
                continue;
            };
            // A concurrent delete between listing and reading is not an error
            if let Some(record) = self.read(&id, &path)? {
                records.push(record);
            }
        }
        sort_records(&mut records);
        Ok(records)
    }
}

#[async_trait]
impl CollectionStore for FileStore {
    async fn get(&self, id: &str) -> Result<Option<PhotoRecord>> {
        match self.path_for(id) {
            Some(path) => self.read(id, &path),
            None => Ok(None),
        }
    }

    async fn create(&self, record: &PhotoRecord) -> Result<()> {
        let path = self.path_for(&record.id).ok_or_else(|| Error::Codec {
            id: record.id.clone(),
            message: "identifier is not a valid file name".to_string(),
        })?;

        let temp = self.write_temp(record)?;
        let linked = std::fs::hard_link(&temp, &path);
        let _ = std::fs::remove_file(&temp);

        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(Error::AlreadyExists {
                id: record.id.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, record: &PhotoRecord) -> Result<()> {
        let path = self.path_for(&record.id).ok_or_else(|| Error::Codec {
            id: record.id.clone(),
            message: "identifier is not a valid file name".to_string(),
        })?;

        let temp = self.write_temp(record)?;
        if let Err(e) = std::fs::rename(&temp, &path) {
            let _ = std::fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }

    async fn update(&self, id: &str, update: &RecordUpdate) -> Result<()> {
        let path = self.path_for(id).ok_or_else(|| Error::not_found(id))?;
        let claimed = self.temp_path(id);
        match std::fs::rename(&path, &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::not_found(id)),
            Err(e) => return Err(e.into()),
        }

        let written = self.read(id, &claimed).and_then(|record| {
            let mut record = record.ok_or_else(|| Error::not_found(id))?;
            update.apply(&mut record);
            let temp = self.write_temp(&record)?;
            let linked = std::fs::hard_link(&temp, &path);
            let _ = std::fs::remove_file(&temp);
            linked.map_err(Error::from)
        });
        if written.is_err() {
            // Put the unchanged document back
            let _ = std::fs::hard_link(&claimed, &path);
        }
        let _ = std::fs::remove_file(&claimed);
        written
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id).ok_or_else(|| Error::not_found(id))?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.ids()?.len() as u64)
    }

    async fn list_all(&self) -> Result<Vec<PhotoRecord>> {
        self.read_all()
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<PhotoRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.owner_id == owner_id)
            .collect())
    }
}
