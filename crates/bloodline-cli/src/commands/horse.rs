//! Horse record commands

use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Args, Subcommand};

use crate::output::{list_or_dash, print_json, table, OutputFormat};
use crate::{AppContext, Cli};
use bloodline_core::{Animal, AnimalId, BehaviorState, Sex, Stat, TraitSet};
use bloodline_storage::StorageBackend;

#[derive(Args)]
pub struct HorseArgs {
    #[command(subcommand)]
    pub command: HorseCommands,
}

#[derive(Subcommand)]
pub enum HorseCommands {
    /// Add or replace a horse
    Add {
        /// Horse name
        name: String,
        /// Explicit id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Sex: male/stallion/colt or female/mare/filly
        #[arg(long)]
        sex: Option<Sex>,
        /// Sire id
        #[arg(long)]
        sire: Option<String>,
        /// Dam id
        #[arg(long)]
        dam: Option<String>,
        /// Stat as name=value, e.g. speed=72
        #[arg(long = "stat", value_parser = parse_stat)]
        stats: Vec<(Stat, f64)>,
        /// Positive trait
        #[arg(long = "positive")]
        positive: Vec<String>,
        /// Negative trait
        #[arg(long = "negative")]
        negative: Vec<String>,
        /// Hidden trait
        #[arg(long = "hidden")]
        hidden: Vec<String>,
        /// Stress level 0-100
        #[arg(long)]
        stress: Option<f64>,
        /// Bond score 0-100
        #[arg(long)]
        bond: Option<f64>,
        /// Foaling date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        born: Option<chrono::DateTime<Utc>>,
    },
    /// Show a horse
    Get {
        /// Horse id
        id: String,
    },
    /// List horses
    List {
        /// Limit results
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },
    /// Delete a horse
    Delete {
        /// Horse id
        id: String,
    },
}

fn parse_stat(raw: &str) -> Result<(Stat, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Expected name=value, got '{}'", raw))?;
    let stat: Stat = name.trim().parse()?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("Invalid value for {}: '{}'", stat, value))?;
    Ok((stat, value))
}

fn parse_date(raw: &str) -> Result<chrono::DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}", raw, e))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("Invalid date '{}'", raw))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

pub async fn run(args: &HorseArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let format = OutputFormat::from(cli.format.as_str());

    match &args.command {
        HorseCommands::Add {
            name,
            id,
            sex,
            sire,
            dam,
            stats,
            positive,
            negative,
            hidden,
            stress,
            bond,
            born,
        } => {
            let id = id
                .as_deref()
                .map(AnimalId::new)
                .unwrap_or_else(AnimalId::generate);

            let traits = TraitSet {
                positive: positive.iter().cloned().collect(),
                negative: negative.iter().cloned().collect(),
                hidden: hidden.iter().cloned().collect(),
            };
            let mut animal = Animal::new(id, name.as_str()).with_traits(traits);
            animal.sex = *sex;
            animal.sire_id = sire.as_deref().map(AnimalId::new);
            animal.dam_id = dam.as_deref().map(AnimalId::new);
            animal.born_at = *born;
            for (stat, value) in stats {
                animal = animal.with_stat(*stat, *value);
            }
            if stress.is_some() || bond.is_some() {
                let base = BehaviorState::default();
                animal = animal.with_behavior(BehaviorState::new(
                    stress.unwrap_or(base.stress_level),
                    bond.unwrap_or(base.bond_score),
                ));
            }

            ctx.storage.save_animal(&animal).await?;
            tracing::info!("Saved horse {}", animal.id);

            match format {
                OutputFormat::Json => print_json(&animal)?,
                OutputFormat::Table => println!("Added horse: {} ({})", animal.name, animal.id),
            }
        }
        HorseCommands::Get { id } => {
            let id = AnimalId::new(id.as_str());
            let Some(animal) = StorageBackend::get_animal(ctx.storage.as_ref(), &id).await? else {
                anyhow::bail!("Horse '{}' not found", id);
            };

            match format {
                OutputFormat::Json => print_json(&animal)?,
                OutputFormat::Table => print_horse(&animal),
            }
        }
        HorseCommands::List { limit } => {
            let mut animals = ctx.storage.get_all_animals().await?;
            animals.truncate(*limit);
            tracing::info!("Found {} horses", animals.len());

            match format {
                OutputFormat::Json => print_json(&animals)?,
                OutputFormat::Table if animals.is_empty() => println!("No horses found"),
                OutputFormat::Table => {
                    let rows: Vec<Vec<String>> = animals
                        .iter()
                        .map(|a| {
                            vec![
                                a.id.to_string(),
                                a.name.clone(),
                                a.sex.map(|s| format!("{:?}", s).to_lowercase()).unwrap_or_default(),
                                a.sire_id.as_ref().map(|p| p.to_string()).unwrap_or_default(),
                                a.dam_id.as_ref().map(|p| p.to_string()).unwrap_or_default(),
                                a.traits.len().to_string(),
                            ]
                        })
                        .collect();
                    println!(
                        "{}",
                        table(&["id", "name", "sex", "sire", "dam", "traits"], &rows)
                    );
                }
            }
        }
        HorseCommands::Delete { id } => {
            let id = AnimalId::new(id.as_str());
            ctx.storage.delete_animal(&id).await?;
            tracing::info!("Deleted horse {}", id);
            println!("Deleted horse: {}", id);
        }
    }

    Ok(())
}

fn print_horse(animal: &Animal) {
    println!("Horse: {} ({})", animal.name, animal.id);
    if let Some(sex) = animal.sex {
        println!("  Sex: {}", format!("{:?}", sex).to_lowercase());
    }
    if let Some(sire) = &animal.sire_id {
        println!("  Sire: {}", sire);
    }
    if let Some(dam) = &animal.dam_id {
        println!("  Dam: {}", dam);
    }
    if let Some(born) = animal.born_at {
        println!("  Born: {}", born.format("%Y-%m-%d"));
    }
    if !animal.stats.is_empty() {
        println!("  Stats:");
        for (stat, value) in &animal.stats {
            println!("    {:<13} {:>5.1}", stat.as_str(), value);
        }
    }
    let category = |set: &std::collections::BTreeSet<String>| {
        list_or_dash(&set.iter().collect::<Vec<_>>())
    };
    println!("  Positive traits: {}", category(&animal.traits.positive));
    println!("  Negative traits: {}", category(&animal.traits.negative));
    println!("  Hidden traits: {}", category(&animal.traits.hidden));
    if let Some(behavior) = animal.behavior {
        println!(
            "  Behavior: stress {:.0}, bond {:.0}",
            behavior.stress_level, behavior.bond_score
        );
    }
}
