//! Inbreeding coefficient command

use clap::Args;

use crate::output::{percent, print_json, table, OutputFormat};
use crate::{AppContext, Cli};
use bloodline_core::AnimalId;

#[derive(Args)]
pub struct InbreedingArgs {
    /// First horse id
    pub first: String,

    /// Second horse id
    pub second: String,

    /// Generations to compare (default from config)
    #[arg(long)]
    pub depth: Option<u32>,
}

pub async fn run(args: &InbreedingArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let result = ctx
        .engine
        .compute_inbreeding(
            &AnimalId::new(args.first.as_str()),
            &AnimalId::new(args.second.as_str()),
            args.depth,
        )
        .await?;

    if OutputFormat::from(cli.format.as_str()) == OutputFormat::Json {
        return print_json(&result);
    }

    println!(
        "Inbreeding {} x {} (depth {})",
        result.first, result.second, result.depth
    );
    println!(
        "Coefficient: {:.4} ({}), risk: {}",
        result.coefficient,
        percent(result.coefficient),
        result.risk
    );

    if result.common_ancestors.is_empty() {
        println!("No common ancestors within {} generations", result.depth);
    } else {
        let rows: Vec<Vec<String>> = result
            .common_ancestors
            .iter()
            .map(|a| {
                vec![
                    a.animal_id.to_string(),
                    format!("{:.4}", a.contribution),
                    a.paths.len().to_string(),
                    a.closest_generation.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            table(&["ancestor", "contribution", "paths", "closest"], &rows)
        );
    }

    println!();
    for recommendation in &result.recommendations {
        println!("- {}", recommendation);
    }
    Ok(())
}
