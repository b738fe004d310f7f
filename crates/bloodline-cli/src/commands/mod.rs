//! CLI command implementations

pub mod compat;
pub mod completions;
pub mod config;
pub mod diversity;
pub mod horse;
pub mod inbreeding;
pub mod io;
pub mod lineage;
pub mod traits;

use bloodline_core::AnimalId;

/// Convert raw command-line ids
pub(crate) fn animal_ids(raw: &[String]) -> Vec<AnimalId> {
    raw.iter().map(|id| AnimalId::new(id.as_str())).collect()
}
