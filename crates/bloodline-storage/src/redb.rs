//! ReDB storage backend

use crate::error::{StorageError, StorageResult};
use crate::traits::{check_animal, StorageBackend};
use async_trait::async_trait;
use bloodline_core::{Animal, AnimalId, AnimalProvider};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;
use std::sync::Mutex;

// Animal id -> JSON record
const ANIMALS: TableDefinition<&str, &[u8]> = TableDefinition::new("animals");

/// ReDB storage backend
pub struct RedbStorage {
    db: Mutex<Database>,
}

impl RedbStorage {
    /// Open or create a ReDB database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path).map_err(|e| StorageError::Database(e.to_string()))?;

        {
            let write_txn = db
                .begin_write()
                .map_err(|e| StorageError::Database(e.to_string()))?;
            {
                let _ = write_txn.open_table(ANIMALS)?;
            }
            write_txn
                .commit()
                .map_err(|e| StorageError::Database(e.to_string()))?;
        }

        tracing::debug!("Opened animal database");
        Ok(Self { db: Mutex::new(db) })
    }

    /// Number of stored animals
    pub fn count(&self) -> StorageResult<u64> {
        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let read_txn = db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let table = read_txn.open_table(ANIMALS)?;
        Ok(table.len()?)
    }
}

#[async_trait]
impl StorageBackend for RedbStorage {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        Ok(self.count().is_ok())
    }

    async fn save_animal(&self, animal: &Animal) -> StorageResult<()> {
        check_animal(animal)?;
        let value = serde_json::to_vec(animal)?;

        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        {
            let mut table = write_txn.open_table(ANIMALS)?;
            table.insert(animal.id.as_str(), value.as_slice())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    async fn get_animal(&self, id: &AnimalId) -> StorageResult<Option<Animal>> {
        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let read_txn = db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let table = read_txn.open_table(ANIMALS)?;

        if let Some(value) = table.get(id.as_str())? {
            let animal: Animal = serde_json::from_slice(value.value())?;
            Ok(Some(animal))
        } else {
            Ok(None)
        }
    }

    async fn get_animals(&self, ids: &[AnimalId]) -> StorageResult<Vec<Animal>> {
        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let read_txn = db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let table = read_txn.open_table(ANIMALS)?;

        let mut animals = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(value) = table.get(id.as_str())? {
                animals.push(serde_json::from_slice(value.value())?);
            }
        }

        Ok(animals)
    }

    async fn get_all_animals(&self) -> StorageResult<Vec<Animal>> {
        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let read_txn = db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let table = read_txn.open_table(ANIMALS)?;

        let mut animals = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            animals.push(serde_json::from_slice(value.value())?);
        }

        Ok(animals)
    }

    async fn delete_animal(&self, id: &AnimalId) -> StorageResult<()> {
        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let removed = {
            let mut table = write_txn.open_table(ANIMALS)?;
            let removed = table.remove(id.as_str())?.is_some();
            removed
        };
        if !removed {
            write_txn.abort()?;
            return Err(StorageError::AnimalNotFound(id.to_string()));
        }
        write_txn.commit()?;

        Ok(())
    }

    async fn save_animals(&self, animals: &[Animal]) -> StorageResult<()> {
        for animal in animals {
            check_animal(animal)?;
        }

        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        {
            let mut table = write_txn.open_table(ANIMALS)?;
            for animal in animals {
                let value = serde_json::to_vec(animal)?;
                table.insert(animal.id.as_str(), value.as_slice())?;
            }
        }
        write_txn.commit()?;

        tracing::debug!("Saved {} animals in one transaction", animals.len());
        Ok(())
    }
}

#[async_trait]
impl AnimalProvider for RedbStorage {
    async fn get_animal(&self, id: &AnimalId) -> bloodline_core::Result<Option<Animal>> {
        Ok(StorageBackend::get_animal(self, id).await?)
    }

    async fn get_animals(&self, ids: &[AnimalId]) -> bloodline_core::Result<Vec<Animal>> {
        Ok(StorageBackend::get_animals(self, ids).await?)
    }
}
