//! In-memory storage backend for testing

use crate::error::{StorageError, StorageResult};
use crate::traits::{check_animal, StorageBackend};
use async_trait::async_trait;
use bloodline_core::{Animal, AnimalId, AnimalProvider};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage backend
///
/// Useful for testing and temporary storage.
pub struct MemoryStorage {
    animals: RwLock<HashMap<AnimalId, Animal>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            animals: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        Ok(true)
    }

    async fn save_animal(&self, animal: &Animal) -> StorageResult<()> {
        check_animal(animal)?;
        let mut animals = self
            .animals
            .write()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))?;
        animals.insert(animal.id.clone(), animal.clone());
        Ok(())
    }

    async fn get_animal(&self, id: &AnimalId) -> StorageResult<Option<Animal>> {
        let animals = self
            .animals
            .read()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))?;
        Ok(animals.get(id).cloned())
    }

    async fn get_animals(&self, ids: &[AnimalId]) -> StorageResult<Vec<Animal>> {
        let animals = self
            .animals
            .read()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))?;
        Ok(ids.iter().filter_map(|id| animals.get(id).cloned()).collect())
    }

    async fn get_all_animals(&self) -> StorageResult<Vec<Animal>> {
        let animals = self
            .animals
            .read()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))?;
        let mut all: Vec<Animal> = animals.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn delete_animal(&self, id: &AnimalId) -> StorageResult<()> {
        let mut animals = self
            .animals
            .write()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))?;
        animals
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::AnimalNotFound(id.to_string()))
    }
}

#[async_trait]
impl AnimalProvider for MemoryStorage {
    async fn get_animal(&self, id: &AnimalId) -> bloodline_core::Result<Option<Animal>> {
        Ok(StorageBackend::get_animal(self, id).await?)
    }

    async fn get_animals(&self, ids: &[AnimalId]) -> bloodline_core::Result<Vec<Animal>> {
        Ok(StorageBackend::get_animals(self, ids).await?)
    }
}
