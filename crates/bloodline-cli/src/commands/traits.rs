//! Trait interaction command

use chrono::Utc;
use clap::Args;
use serde::Serialize;

use crate::output::{list_or_dash, print_json, table, OutputFormat};
use crate::{AppContext, Cli};
use bloodline_core::{AnimalId, BehaviorState, TemporalProjection, TraitInteractionGraph};
use bloodline_storage::StorageBackend;

#[derive(Args)]
pub struct TraitsArgs {
    /// Horse id
    pub id: String,

    /// Override stress level 0-100
    #[arg(long)]
    pub stress: Option<f64>,

    /// Override bond score 0-100
    #[arg(long)]
    pub bond: Option<f64>,

    /// Also project stability over this many days
    #[arg(long)]
    pub window_days: Option<u32>,
}

#[derive(Serialize)]
struct TraitsOutput {
    graph: TraitInteractionGraph,
    #[serde(skip_serializing_if = "Option::is_none")]
    projection: Option<TemporalProjection>,
}

pub async fn run(args: &TraitsArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let id = AnimalId::new(args.id.as_str());

    let environment = if args.stress.is_some() || args.bond.is_some() {
        // Flags override single fields of the recorded state
        let base = StorageBackend::get_animal(ctx.storage.as_ref(), &id)
            .await?
            .and_then(|animal| animal.behavior)
            .unwrap_or_default();
        Some(BehaviorState::new(
            args.stress.unwrap_or(base.stress_level),
            args.bond.unwrap_or(base.bond_score),
        ))
    } else {
        None
    };

    let graph = ctx.engine.analyze_trait_interactions(&id, environment).await?;
    let projection = match args.window_days {
        Some(days) => Some(
            ctx.engine
                .project_trait_stability(&id, days, Utc::now())
                .await?,
        ),
        None => None,
    };

    let output = TraitsOutput { graph, projection };
    match OutputFormat::from(cli.format.as_str()) {
        OutputFormat::Json => print_json(&output)?,
        OutputFormat::Table => print_output(&id, &output),
    }
    Ok(())
}

fn print_output(id: &AnimalId, output: &TraitsOutput) {
    let graph = &output.graph;
    println!("Trait interactions of {}", id);

    if graph.nodes.is_empty() {
        println!("No traits recorded");
    } else {
        let rows: Vec<Vec<String>> = graph
            .nodes
            .iter()
            .map(|n| {
                vec![
                    n.name.clone(),
                    format!("{:?}", n.category).to_lowercase(),
                    format!("{:?}", n.level).to_lowercase(),
                    format!("{:.2}", n.dominance_score),
                ]
            })
            .collect();
        println!("{}", table(&["trait", "category", "tier", "dominance"], &rows));
    }

    println!();
    println!(
        "Primary: {}",
        graph.dominance.primary.as_deref().unwrap_or("-")
    );
    println!("Secondary: {}", list_or_dash(&graph.dominance.secondary));
    println!("Recessive: {}", list_or_dash(&graph.dominance.recessive));

    for synergy in &graph.synergies {
        println!(
            "+ {} <-> {} ({} cluster, {:.2})",
            synergy.first, synergy.second, synergy.cluster, synergy.strength
        );
    }
    for conflict in &graph.conflicts {
        println!(
            "- {} <-> {} (conflict, {:.2})",
            conflict.first, conflict.second, conflict.strength
        );
    }
    for property in &graph.emergent_properties {
        println!(
            "* {} [{}]: {}",
            property.name,
            property.traits.join(", "),
            property.description
        );
    }

    let stability = &graph.stability;
    println!();
    println!(
        "Harmony {:.2}, stability {:.2}",
        graph.harmony, stability.overall
    );
    println!("Risk factors: {}", list_or_dash(&stability.risk_factors));
    println!(
        "Protective factors: {}",
        list_or_dash(&stability.protective_factors)
    );
    for recommendation in &stability.recommendations {
        println!("- {}", recommendation);
    }

    if let Some(projection) = &output.projection {
        println!();
        println!(
            "Projection over {} days from age {}: {:?}",
            projection.window_days, projection.start_age_days, projection.trend
        );
        let rows: Vec<Vec<String>> = projection
            .snapshots
            .iter()
            .map(|s| {
                vec![
                    s.week.to_string(),
                    s.age_days.to_string(),
                    format!("{:.2}", s.maturity),
                    format!("{:.3}", s.stability),
                ]
            })
            .collect();
        println!("{}", table(&["week", "age", "maturity", "stability"], &rows));
    }
}
