use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use strata::config::Config;
use strata::output::terminal;
use strata::pipeline::{places, topics};

/// Strata: time-bucketed topic and place signals for corpus visualization.
///
/// Turns topic model and geocoder output into per-year series, place
/// co-occurrence graphs and topic correlations for a static front end.
#[derive(Parser)]
#[command(name = "strata", version, about)]
struct Cli {
    /// Output directory (overrides STRATA_OUTPUT_DIR)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate topic model output into per-topic series and correlations
    Topics {
        /// Document metadata JSON
        #[arg(long)]
        metadata: PathBuf,

        /// Per-document topic weights
        #[arg(long, default_value = "doc-topics.txt")]
        doc_topics: PathBuf,

        /// Ranked top words per topic
        #[arg(long, default_value = "topic-keys.txt")]
        topic_keys: PathBuf,

        /// Topic diagnostics XML
        #[arg(long, default_value = "diagnostics.xml")]
        diagnostics: PathBuf,

        /// Base name for the output files
        #[arg(long, default_value = "topics")]
        name: String,

        /// Reuse the cached snapshot when the inputs haven't changed
        #[arg(long)]
        dry: bool,

        /// How many correlated topic pairs to print (default: 5)
        #[arg(long, default_value = "5")]
        show: usize,
    },

    /// Aggregate geocoder output into place weights and origin edges
    Places {
        /// Document metadata JSON
        #[arg(long)]
        metadata: PathBuf,

        /// Geocoder output JSON
        #[arg(long, default_value = "geoparse.json")]
        geoparse: PathBuf,

        /// Base name for the output files
        #[arg(long, default_value = "geoparse")]
        name: String,

        /// Reuse the cached snapshot when the inputs haven't changed
        #[arg(long)]
        dry: bool,
    },
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("strata=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    match cli.command {
        Commands::Topics {
            metadata,
            doc_topics,
            topic_keys,
            diagnostics,
            name,
            dry,
            show,
        } => {
            let inputs = topics::TopicInputs {
                metadata,
                doc_topics,
                topic_keys,
                diagnostics,
            };
            info!(run_name = %name, dry, "Starting topic run");
            let run = topics::run(&inputs, &config, &name, dry)?;

            match &run.log {
                Some(log) => terminal::display_batch_log("Topic aggregation", log),
                None => println!("\n{}", "Reused topic snapshot (inputs unchanged).".bold()),
            }
            println!(
                "  Topics: {}  Buckets: {}  Documents: {}",
                run.aggregate.signals.topic_count(),
                run.aggregate.signals.buckets.len(),
                run.aggregate.total_documents
            );
            terminal::display_top_correlations(&run.stats, show);
            terminal::display_outputs(
                run.log.as_ref().map(|_| run.snapshot_path.as_path()),
                &run.payload_path,
            );
        }

        Commands::Places {
            metadata,
            geoparse,
            name,
            dry,
        } => {
            let inputs = places::PlaceInputs { metadata, geoparse };
            info!(run_name = %name, dry, "Starting place run");
            let run = places::run(&inputs, &config, &name, dry)?;

            match &run.log {
                Some(log) => terminal::display_batch_log("Place aggregation", log),
                None => println!("\n{}", "Reused place snapshot (inputs unchanged).".bold()),
            }
            let edge_count: usize = run.signals.links_by_year.iter().map(Vec::len).sum();
            println!(
                "  Places: {}  Edges: {}  Largest country weight: {}",
                run.signals.weights.len(),
                edge_count,
                run.signals.max_country_weight()
            );
            terminal::display_outputs(
                run.log.as_ref().map(|_| run.snapshot_path.as_path()),
                &run.payload_path,
            );
        }
    }

    Ok(())
}
