//! Entry point for the `targetscope` binary: disease-to-target ranking from
//! pathway, annotation and interaction network data.

mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use targetscope_common::CancellationFlag;
use targetscope_ranker::{DiseaseSummary, RankedTargets, TargetPipeline};

#[derive(Debug, Parser)]
#[command(name = "targetscope", version, about = "Rank druggable protein targets for a disease")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank targets for one disease
    Rank {
        disease: String,
        #[arg(long)]
        max_targets: Option<usize>,
        /// Skip interaction network and centrality analysis
        #[arg(long)]
        no_network: bool,
        /// Write the ranking as CSV (default directory from `output.export_dir`)
        #[arg(long, value_name = "DIR")]
        export: Option<Option<PathBuf>>,
        /// Print the scoring report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Compare top targets across diseases
    Compare {
        #[arg(required = true, num_args = 1..)]
        diseases: Vec<String>,
        #[arg(long, default_value_t = 20)]
        max_targets: usize,
    },
    /// Detailed JSON report for one disease
    Report {
        disease: String,
        #[arg(long)]
        max_targets: Option<usize>,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("targetscope=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load()?;
    info!(version = env!("CARGO_PKG_VERSION"), "TargetScope starting");

    if let Command::Config = cli.command {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let default_max = config.output.max_targets;
    let default_export = config.output.export_dir.clone();
    let pipeline = TargetPipeline::new(config).context("Failed to build pipeline")?;

    match cli.command {
        Command::Rank { disease, max_targets, no_network, export, json } => {
            let cancel = CancellationFlag::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received, cancelling after in-flight requests");
                    on_interrupt.cancel();
                }
            });

            let ranked = pipeline
                .identify_and_rank_targets_with_cancel(
                    &disease,
                    max_targets.unwrap_or(default_max),
                    !no_network,
                    &cancel,
                )
                .await
                .with_context(|| format!("Ranking failed for {disease}"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&ranked.report)?);
            } else {
                print_table(&ranked);
            }
            if let Some(dir) = export {
                let dir = dir.unwrap_or(default_export);
                let path = pipeline.save_results(&ranked, &dir)?;
                info!(path = %path.display(), "Results saved");
            }
        }
        Command::Compare { diseases, max_targets } => {
            let comparison = pipeline.compare_diseases(&diseases, max_targets).await?;
            for (disease, summary) in &comparison {
                match summary {
                    DiseaseSummary::Ranked { total_targets, top_target, top_score, .. } => println!(
                        "{disease}: {total_targets} targets, top {} ({:.3})",
                        top_target.as_deref().unwrap_or("-"),
                        top_score.unwrap_or(0.0)
                    ),
                    DiseaseSummary::Failed { error } => println!("{disease}: failed: {error}"),
                }
            }
        }
        Command::Report { disease, max_targets } => {
            let report = pipeline
                .generate_detailed_report(&disease, max_targets.unwrap_or(default_max))
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Config => {}
    }

    Ok(())
}

fn print_table(ranked: &RankedTargets) {
    println!(
        "{:>4}  {:<12} {:>7} {:>7} {:>7} {:>7} {:>7} {:>6}  {}",
        "rank", "protein", "final", "drug", "central", "pathway", "disease", "conf", "quality"
    );
    for t in &ranked.targets {
        println!(
            "{:>4}  {:<12} {:>7.3} {:>7.3} {:>7.3} {:>7.3} {:>7.3} {:>6.2}  {}/{}",
            t.rank,
            t.protein_id,
            t.final_score,
            t.druggability_score,
            t.centrality_score,
            t.pathway_score,
            t.disease_score,
            t.confidence_score,
            t.data_quality,
            t.network_quality,
        );
    }
    let r = &ranked.report;
    println!(
        "\n{} scored, {} excluded, {} pathways (run {})",
        r.scored_count, r.excluded_count, r.pathway_count, ranked.run_id
    );
}
