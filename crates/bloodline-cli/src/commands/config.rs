//! Config command for managing CLI configuration

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::config::{config_file_path, default_data_dir, Config};
use bloodline_core::AnalysisConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Get a config value
    Get {
        /// Config key name
        key: String,
    },
    /// Set a config value (an empty value clears optional keys)
    Set {
        /// Config key name
        key: String,
        /// New value
        value: String,
    },
    /// List config values and the resolved analysis settings
    List,
    /// Show config file path
    Path,
    /// Initialize default config file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

pub async fn run(args: &ConfigArgs) -> anyhow::Result<()> {
    match &args.command {
        ConfigCommands::Get { key } => run_get(key),
        ConfigCommands::Set { key, value } => run_set(key, value),
        ConfigCommands::List => run_list(),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Init { force } => run_init(*force),
    }
}

fn run_get(key: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    match config.get(key) {
        Some(value) => println!("{}", value),
        None => anyhow::bail!(
            "Unknown config key: {}. Available keys: {}",
            key,
            Config::keys().join(", ")
        ),
    }
    Ok(())
}

fn run_set(key: &str, value: &str) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;
    tracing::info!("Updated config key {}", key);
    println!("Set {} = {}", key, value);
    Ok(())
}

fn run_list() -> anyhow::Result<()> {
    let config = Config::load()?;
    println!("Config file: {}", config_file_path().display());
    println!();
    for key in Config::keys() {
        let value = config.get(key).unwrap_or_default();
        println!("{} = {}", key, value);
    }

    println!();
    println!("Data directory: {}", resolved_data_dir(&config).display());
    match config.analysis_config() {
        Ok(analysis) => print_analysis(&config, &analysis),
        Err(e) => println!("Analysis settings unavailable: {:#}", e),
    }
    Ok(())
}

fn resolved_data_dir(config: &Config) -> PathBuf {
    config.data_dir.clone().unwrap_or_else(default_data_dir)
}

fn print_analysis(config: &Config, analysis: &AnalysisConfig) {
    let catalog = &analysis.catalog;
    let source = config
        .catalog_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in".to_string());

    println!("Lineage depth: {}", analysis.default_depth);
    println!("Compatibility depth: {}", analysis.compatibility_depth);
    println!(
        "Fetch timeout: {}",
        analysis
            .fetch_timeout_ms
            .map(|ms| format!("{} ms", ms))
            .unwrap_or_else(|| "none".to_string())
    );
    println!(
        "Trait catalog: {} ({} synergy clusters, {} conflict pairs, {} emergent rules)",
        source,
        catalog.synergy_clusters.len(),
        catalog.conflict_pairs.len(),
        catalog.emergent_rules.len()
    );
}

fn run_path() -> anyhow::Result<()> {
    println!("{}", config_file_path().display());
    Ok(())
}

fn run_init(force: bool) -> anyhow::Result<()> {
    let path = config_file_path();

    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    Config::default().save()?;
    println!("Created config file at {}", path.display());
    Ok(())
}
