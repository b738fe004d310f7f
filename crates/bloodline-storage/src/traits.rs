//! Storage backend trait definitions

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use bloodline_core::{limits, Animal, AnimalId};

/// Trait for storage backend implementations
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Initialize the storage (create tables, etc.)
    async fn initialize(&self) -> StorageResult<()>;

    /// Close the storage connection
    async fn close(&self) -> StorageResult<()>;

    /// Health check
    async fn health_check(&self) -> StorageResult<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Animal Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Save an animal, replacing any record with the same id
    async fn save_animal(&self, animal: &Animal) -> StorageResult<()>;

    /// Get an animal by id
    async fn get_animal(&self, id: &AnimalId) -> StorageResult<Option<Animal>>;

    /// Get several animals; unknown ids are left out
    async fn get_animals(&self, ids: &[AnimalId]) -> StorageResult<Vec<Animal>>;

    /// Get every stored animal
    async fn get_all_animals(&self) -> StorageResult<Vec<Animal>>;

    /// Delete an animal; fails with `AnimalNotFound` when absent
    async fn delete_animal(&self, id: &AnimalId) -> StorageResult<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Bulk Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Save many animals
    async fn save_animals(&self, animals: &[Animal]) -> StorageResult<()> {
        for animal in animals {
            self.save_animal(animal).await?;
        }
        Ok(())
    }
}

/// Reject records the analyses cannot use
pub(crate) fn check_animal(animal: &Animal) -> StorageResult<()> {
    let invalid = |e: limits::ValidationError| StorageError::InvalidAnimal(e.to_string());

    limits::validate_animal_id(&animal.id).map_err(invalid)?;
    limits::validate_traits(&animal.traits).map_err(invalid)?;
    limits::validate_stats(&animal.stats).map_err(invalid)?;
    if let Some(behavior) = &animal.behavior {
        limits::validate_environment(behavior).map_err(invalid)?;
    }
    if animal.has_parent(&animal.id) {
        return Err(StorageError::InvalidAnimal(format!(
            "{} cannot be its own parent",
            animal.id
        )));
    }
    if animal.sire_id.is_some() && animal.sire_id == animal.dam_id {
        return Err(StorageError::InvalidAnimal(format!(
            "{} has the same sire and dam",
            animal.id
        )));
    }
    Ok(())
}
