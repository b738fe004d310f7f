//! Population diversity command

use clap::Args;

use super::animal_ids;
use crate::output::{percent, print_json, table, OutputFormat};
use crate::{AppContext, Cli};
use bloodline_core::{AnimalId, DiversityReport};
use bloodline_storage::StorageBackend;

#[derive(Args)]
pub struct DiversityArgs {
    /// Horse ids (every stored horse when omitted)
    pub ids: Vec<String>,

    /// Trait rows to show in table output
    #[arg(long, default_value = "10")]
    pub top: usize,
}

pub async fn run(args: &DiversityArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let ids: Vec<AnimalId> = if args.ids.is_empty() {
        ctx.storage
            .get_all_animals()
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect()
    } else {
        animal_ids(&args.ids)
    };
    tracing::debug!("Analyzing diversity of {} horses", ids.len());

    let report = ctx.engine.analyze_diversity(&ids).await?;

    match OutputFormat::from(cli.format.as_str()) {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(&report, args.top),
    }
    Ok(())
}

fn print_report(report: &DiversityReport, top: usize) {
    println!("Population: {} horses", report.population_size);
    if report.population_size == 0 {
        println!("Nothing to analyze");
        return;
    }

    println!("Diversity score: {:.1} / 100", report.diversity_score);
    println!(
        "Shannon {:.3}, Simpson {:.3}, heterozygosity {:.3}",
        report.indices.shannon, report.indices.simpson, report.indices.expected_heterozygosity
    );
    let ne = &report.effective_population;
    println!(
        "Effective size: {} ({} males, {} females, ratio {:.2})",
        ne.effective_size, ne.males, ne.females, ne.ratio
    );
    println!(
        "Genetic distance: avg {:.3} over {} pairs",
        report.genetic_distance.average, report.genetic_distance.pair_count
    );

    let mut traits: Vec<_> = report.trait_frequencies.iter().collect();
    traits.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(b.0)));
    if !traits.is_empty() {
        println!();
        let rows: Vec<Vec<String>> = traits
            .iter()
            .take(top)
            .map(|(name, f)| vec![name.to_string(), f.count.to_string(), percent(f.carrier_share)])
            .collect();
        println!("{}", table(&["trait", "carriers", "share"], &rows));
    }

    if !report.founders.is_empty() {
        println!();
        let rows: Vec<Vec<String>> = report
            .founders
            .iter()
            .map(|f| {
                vec![
                    f.animal_id.to_string(),
                    f.offspring.to_string(),
                    f.descendants.to_string(),
                    format!("{:.2}", f.influence),
                ]
            })
            .collect();
        println!(
            "{}",
            table(&["founder", "offspring", "descendants", "influence"], &rows)
        );
    }

    for bottleneck in &report.bottlenecks {
        println!(
            "! {:?} bottleneck on {} ({}, {:?})",
            bottleneck.kind,
            bottleneck.subject,
            percent(bottleneck.frequency),
            bottleneck.severity
        );
    }
    if !report.recommendations.is_empty() {
        println!();
        for recommendation in &report.recommendations {
            println!("- {}", recommendation);
        }
    }
}
