//! Pedigree command

use clap::Args;

use super::animal_ids;
use crate::output::{print_json, table, OutputFormat};
use crate::{AppContext, Cli};
use bloodline_core::{LineageView, ParentLine};

#[derive(Args)]
pub struct LineageArgs {
    /// Root horse id (one or two)
    #[arg(required = true, num_args = 1..=2)]
    pub ids: Vec<String>,

    /// Generations to walk (default from config)
    #[arg(long)]
    pub depth: Option<u32>,
}

pub async fn run(args: &LineageArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let roots = animal_ids(&args.ids);
    tracing::debug!("Building lineage for {:?}", args.ids);

    let view = ctx.engine.build_lineage(&roots, args.depth).await?;

    match OutputFormat::from(cli.format.as_str()) {
        OutputFormat::Json => print_json(&view)?,
        OutputFormat::Table => print_view(&view),
    }
    Ok(())
}

/// "S-D" style path from the root
fn path_label(path: &[ParentLine]) -> String {
    if path.is_empty() {
        return "(root)".to_string();
    }
    path.iter()
        .map(|line| match line {
            ParentLine::Sire => "S",
            ParentLine::Dam => "D",
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn print_view(view: &LineageView) {
    for lineage in &view.lineages {
        println!(
            "Lineage of {} (depth {}, reached {})",
            lineage.root,
            lineage.max_depth,
            lineage.depth_reached()
        );

        let rows: Vec<Vec<String>> = lineage
            .nodes
            .iter()
            .map(|node| {
                let name = view
                    .animal(&node.animal_id)
                    .map(|a| a.name.clone())
                    .unwrap_or_default();
                vec![
                    node.generation.to_string(),
                    node.animal_id.to_string(),
                    name,
                    path_label(&node.path),
                ]
            })
            .collect();
        println!("{}", table(&["gen", "id", "name", "path"], &rows));

        let stats = &lineage.stats;
        println!(
            "{} nodes, {} unique ancestors, {} collapsed, {} missing links",
            stats.total_nodes, stats.unique_ancestors, stats.collapsed_ancestors, stats.missing_links
        );
        let collapsed = lineage.collapsed_ancestors();
        if !collapsed.is_empty() {
            let names: Vec<String> = collapsed.iter().map(|id| id.to_string()).collect();
            println!("Pedigree collapse on: {}", names.join(", "));
        }
        println!();
    }
}
