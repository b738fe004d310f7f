//! CLI configuration

use std::path::{Path, PathBuf};

use anyhow::Context;
use bloodline_core::{AnalysisConfig, TraitCatalog};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "BLOODLINE_CONFIG";

/// Get default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bloodline")
}

/// Location of the config file
pub fn config_file_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bloodline")
        .join("config.toml")
}

/// Configuration for the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_depth")]
    pub default_depth: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_timeout_ms: Option<u64>,

    /// TOML trait catalog replacing the built-in tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
}

fn default_depth() -> u32 {
    4
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_depth: default_depth(),
            fetch_timeout_ms: None,
            catalog_path: None,
        }
    }
}

impl Config {
    /// Load the config file; a missing file yields the defaults
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_file_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn keys() -> &'static [&'static str] {
        &["data_dir", "default_depth", "fetch_timeout_ms", "catalog_path"]
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "data_dir" => Some(
                self.data_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string()),
            ),
            "default_depth" => Some(self.default_depth.to_string()),
            "fetch_timeout_ms" => Some(
                self.fetch_timeout_ms
                    .map(|ms| ms.to_string())
                    .unwrap_or_else(|| "(not set)".to_string()),
            ),
            "catalog_path" => Some(
                self.catalog_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string()),
            ),
            _ => None,
        }
    }

    /// Set a key from its string form; an empty value clears optional keys
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let optional_path = |v: &str| (!v.is_empty()).then(|| PathBuf::from(v));
        match key {
            "data_dir" => self.data_dir = optional_path(value),
            "default_depth" => {
                let depth: u32 = value
                    .parse()
                    .with_context(|| format!("default_depth must be a number, got '{}'", value))?;
                bloodline_core::limits::validate_depth(depth)?;
                self.default_depth = depth;
            }
            "fetch_timeout_ms" => {
                self.fetch_timeout_ms = if value.is_empty() {
                    None
                } else {
                    Some(value.parse().with_context(|| {
                        format!("fetch_timeout_ms must be a number, got '{}'", value)
                    })?)
                };
            }
            "catalog_path" => self.catalog_path = optional_path(value),
            _ => anyhow::bail!(
                "Unknown config key: {}. Available keys: {}",
                key,
                Self::keys().join(", ")
            ),
        }
        Ok(())
    }

    /// Engine settings derived from this file
    pub fn analysis_config(&self) -> anyhow::Result<AnalysisConfig> {
        let mut analysis = AnalysisConfig::default().with_default_depth(self.default_depth);
        analysis.fetch_timeout_ms = self.fetch_timeout_ms;

        if let Some(path) = &self.catalog_path {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read trait catalog {}", path.display()))?;
            analysis = analysis.with_catalog(TraitCatalog::from_toml_str(&source)?);
            tracing::debug!("Loaded trait catalog from {}", path.display());
        }

        analysis.validate()?;
        Ok(analysis)
    }
}
