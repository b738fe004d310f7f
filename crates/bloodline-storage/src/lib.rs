//! Bloodline Storage - Animal record backends
//!
//! This crate persists horse records and serves them to the genetics
//! engine through [`bloodline_core::AnimalProvider`].

#![allow(clippy::result_large_err)]

pub mod error;
pub mod traits;

#[cfg(feature = "redb")]
pub mod redb;

pub mod memory;

pub use error::{StorageError, StorageResult};
pub use traits::StorageBackend;

#[cfg(feature = "redb")]
pub use redb::RedbStorage;

pub use memory::MemoryStorage;
