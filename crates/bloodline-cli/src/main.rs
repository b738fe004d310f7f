//! Bloodline CLI - Command line interface for the breeding genetics engine

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use bloodline_core::GeneticsEngine;
use bloodline_storage::RedbStorage;
use commands::{compat, completions, diversity, horse, inbreeding, io, lineage, traits};
use config::Config;

#[derive(Parser)]
#[command(name = "bloodline")]
#[command(author, version, about = "Pedigree and breeding genetics analysis for horses")]
pub struct Cli {
    /// Data directory
    #[arg(short, long, global = true)]
    pub data_dir: Option<String>,

    /// Output format: table, json
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Data directory: flag, then config file, then the platform default
    pub fn data_dir(&self, config: &Config) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| config.data_dir.clone())
            .unwrap_or_else(config::default_data_dir)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage horse records
    Horse(horse::HorseArgs),
    /// Import horses from a JSON file
    Import(io::ImportArgs),
    /// Export all horses as JSON
    Export(io::ExportArgs),
    /// Show the pedigree of one or two horses
    Lineage(lineage::LineageArgs),
    /// Compute the inbreeding coefficient of a pairing
    Inbreeding(inbreeding::InbreedingArgs),
    /// Analyze the genetic diversity of a population
    Diversity(diversity::DiversityArgs),
    /// Analyze a horse's trait interactions
    Traits(traits::TraitsArgs),
    /// Score the breeding compatibility of two horses
    Compat(compat::CompatArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Application context with storage backend and analysis engine
pub struct AppContext {
    pub storage: Arc<RedbStorage>,
    pub engine: GeneticsEngine<Arc<RedbStorage>>,
}

impl AppContext {
    pub async fn new(cli: &Cli, config: &Config) -> anyhow::Result<Self> {
        let data_dir = cli.data_dir(config);
        std::fs::create_dir_all(&data_dir)?;

        let db_path = data_dir.join("bloodline.redb");
        tracing::debug!("Using database at: {:?}", db_path);

        let storage = Arc::new(RedbStorage::open(&db_path)?);
        let analysis = config.analysis_config()?;
        let engine = GeneticsEngine::with_config(storage.clone(), analysis);

        Ok(Self { storage, engine })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting bloodline CLI");

    // Commands that never touch the database
    match &cli.command {
        Commands::Config(args) => return commands::config::run(args).await,
        Commands::Completions(args) => return completions::run(args),
        _ => {}
    }

    let config = Config::load()?;
    let ctx = AppContext::new(&cli, &config).await?;

    match &cli.command {
        Commands::Horse(args) => horse::run(args, &cli, &ctx).await?,
        Commands::Import(args) => io::run_import(args, &cli, &ctx).await?,
        Commands::Export(args) => io::run_export(args, &cli, &ctx).await?,
        Commands::Lineage(args) => lineage::run(args, &cli, &ctx).await?,
        Commands::Inbreeding(args) => inbreeding::run(args, &cli, &ctx).await?,
        Commands::Diversity(args) => diversity::run(args, &cli, &ctx).await?,
        Commands::Traits(args) => traits::run(args, &cli, &ctx).await?,
        Commands::Compat(args) => compat::run(args, &cli, &ctx).await?,
        Commands::Config(_) | Commands::Completions(_) => {}
    }

    Ok(())
}
