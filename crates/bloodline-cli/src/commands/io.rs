//! Import/Export commands

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{AppContext, Cli};
use bloodline_core::Animal;
use bloodline_storage::StorageBackend;

/// Version written into export files
pub const EXPORT_VERSION: &str = "1.0";

#[derive(Args)]
pub struct ImportArgs {
    /// Input file: a JSON array of horses or an export document
    pub file: PathBuf,

    /// Replace horses whose ids already exist (default: error)
    #[arg(long)]
    pub merge: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Export document
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub version: String,
    pub animals: Vec<Animal>,
}

/// Accepted import shapes
#[derive(Deserialize)]
#[serde(untagged)]
enum ImportData {
    Document(ExportData),
    List(Vec<Animal>),
}

pub async fn run_import(args: &ImportArgs, _cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    tracing::info!("Importing from {:?}", args.file);

    let content = std::fs::read_to_string(&args.file)?;
    let animals = match serde_json::from_str::<ImportData>(&content)? {
        ImportData::Document(data) => {
            tracing::debug!("Import format version: {}", data.version);
            data.animals
        }
        ImportData::List(animals) => animals,
    };

    let mut seen = HashSet::new();
    if let Some(dup) = animals.iter().find(|a| !seen.insert(&a.id)) {
        anyhow::bail!("Duplicate horse id in import file: {}", dup.id);
    }

    if !args.merge {
        let ids: Vec<_> = animals.iter().map(|a| a.id.clone()).collect();
        let existing = StorageBackend::get_animals(ctx.storage.as_ref(), &ids).await?;
        if !existing.is_empty() {
            anyhow::bail!(
                "{} horses already exist (first: {}). Use --merge to replace them.",
                existing.len(),
                existing[0].id
            );
        }
    }

    ctx.storage.save_animals(&animals).await?;

    let ids: HashSet<_> = animals.iter().map(|a| &a.id).collect();
    let dangling = animals
        .iter()
        .flat_map(|a| a.parents())
        .filter(|p| !ids.contains(p))
        .count();
    if dangling > 0 {
        tracing::warn!(
            "{} parent links point outside the imported set; they resolve only if stored already",
            dangling
        );
    }

    println!("Imported {} horses", animals.len());
    Ok(())
}

pub async fn run_export(args: &ExportArgs, _cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    tracing::info!("Exporting data");

    let mut animals = ctx.storage.get_all_animals().await?;
    animals.sort_by(|a, b| a.id.cmp(&b.id));
    tracing::debug!("Exporting {} horses", animals.len());

    let export_data = ExportData {
        version: EXPORT_VERSION.to_string(),
        animals,
    };
    let content = serde_json::to_string_pretty(&export_data)?;

    if let Some(ref path) = args.output {
        // Write with secure permissions (0o600 = owner read/write only)
        #[cfg(unix)]
        {
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)?;
            file.write_all(content.as_bytes())?;
        }
        #[cfg(not(unix))]
        {
            let mut file = std::fs::File::create(path)?;
            file.write_all(content.as_bytes())?;
        }
        println!(
            "Exported {} horses to {}",
            export_data.animals.len(),
            path.display()
        );
    } else {
        println!("{}", content);
    }

    Ok(())
}
