//! Breeding compatibility command

use clap::Args;

use super::animal_ids;
use crate::output::{percent, print_json, OutputFormat};
use crate::{AppContext, Cli};
use bloodline_core::AnimalId;

#[derive(Args)]
pub struct CompatArgs {
    /// First horse id
    pub first: String,

    /// Second horse id
    pub second: String,

    /// Ambient population ids (default: both pedigrees)
    #[arg(long, num_args = 1..)]
    pub population: Vec<String>,
}

pub async fn run(args: &CompatArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let first = AnimalId::new(args.first.as_str());
    let second = AnimalId::new(args.second.as_str());

    let result = if args.population.is_empty() {
        ctx.engine.score_compatibility(&first, &second).await?
    } else {
        let population = animal_ids(&args.population);
        ctx.engine
            .score_compatibility_in(&first, &second, &population)
            .await?
    };

    if OutputFormat::from(cli.format.as_str()) == OutputFormat::Json {
        return print_json(&result);
    }

    println!("Compatibility {} x {}", result.first, result.second);
    println!("Score: {:.1} / 100 ({})", result.score, result.tier);

    let factors = &result.factors;
    println!(
        "  Traits:      {:>5.1}  (overlap {})",
        factors.trait_compatibility,
        percent(factors.trait_overlap)
    );
    println!("  Diversity:   {:>5.1}", factors.diversity_impact);
    println!("  Stats:       {:>5.1}", factors.stat_complementarity);
    println!("  Temperament: {:>5.1}", factors.temperament);
    println!(
        "  Inbreeding:  {:.4} ({}), penalty {}",
        result.inbreeding_coefficient,
        result.inbreeding_risk,
        percent(result.inbreeding_penalty)
    );

    for note in &result.notes {
        println!("- {}", note);
    }
    Ok(())
}
