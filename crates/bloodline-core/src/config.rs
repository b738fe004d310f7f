//! Analysis configuration

use crate::catalog::TraitCatalog;
use crate::error::Result;
use crate::limits;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings shared by every analysis call of a [`crate::GeneticsEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Pedigree depth when a call does not name one
    #[serde(default = "default_depth")]
    pub default_depth: u32,

    /// Pedigree depth used when scoring compatibility
    #[serde(default = "default_compatibility_depth")]
    pub compatibility_depth: u32,

    /// Upper bound on each provider round trip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_timeout_ms: Option<u64>,

    #[serde(default)]
    pub catalog: TraitCatalog,
}

fn default_depth() -> u32 {
    4
}

fn default_compatibility_depth() -> u32 {
    5
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_depth: default_depth(),
            compatibility_depth: default_compatibility_depth(),
            fetch_timeout_ms: None,
            catalog: TraitCatalog::builtin(),
        }
    }
}

impl AnalysisConfig {
    pub fn with_default_depth(mut self, depth: u32) -> Self {
        self.default_depth = depth;
        self
    }

    pub fn with_compatibility_depth(mut self, depth: u32) -> Self {
        self.compatibility_depth = depth;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_catalog(mut self, catalog: TraitCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        limits::validate_depth(self.default_depth)?;
        limits::validate_depth(self.compatibility_depth)?;
        self.catalog.validate()
    }
}
