use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod data;
mod llm;
mod location;
mod optimizer;
mod orchestrator;
mod plan;
mod price;
mod storage;

use config::PlannerConfig;
use location::Coordinates;
use optimizer::OptimizeMode;

#[derive(Parser)]
#[command(name = "shopplan")]
#[command(about = "Turn a free-text project request into an optimized shopping plan", long_about = None)]
struct Cli {
    /// Optional config file (data dir, method label, shop catalog)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for saved requests and results (overrides config)
    #[arg(long, global = true)]
    dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a shopping plan from a free-text request
    Plan {
        /// What you want to make, e.g. "build a birdhouse"
        #[arg(long)]
        request: String,

        /// Planner provider: "mock" or a path to a captured response JSON
        #[arg(long, default_value = "mock")]
        provider: String,

        /// Title for the saved result (defaults to the request text)
        #[arg(long)]
        title: Option<String>,
    },

    /// List saved results
    List,

    /// Show a saved result
    Show {
        /// Result ID to show
        #[arg(long)]
        result_id: String,

        /// Output format (json or md)
        #[arg(long, default_value = "json")]
        format: String,

        /// Your latitude, for store distance display
        #[arg(long, requires = "lng")]
        lat: Option<f64>,

        /// Your longitude, for store distance display
        #[arg(long, requires = "lat")]
        lng: Option<f64>,
    },

    /// Compare the three plan variants for a saved result
    Compare {
        /// Result ID to compare
        #[arg(long)]
        result_id: String,
    },

    /// Re-optimize a saved result and persist the outcome
    Optimize {
        /// Result ID to optimize
        #[arg(long)]
        result_id: String,

        /// Plan variant to apply
        #[arg(long, value_enum)]
        mode: OptimizeMode,
    },

    /// Toggle "I already have this" on an item
    Own {
        /// Result ID containing the item
        #[arg(long)]
        result_id: String,

        /// Item ID within the result
        #[arg(long)]
        item_id: String,
    },

    /// Replace an item with one of its alternatives
    UseAlt {
        /// Result ID containing the item
        #[arg(long)]
        result_id: String,

        /// Item ID within the result
        #[arg(long)]
        item_id: String,

        /// Alternative index (as shown by `show --format md`)
        #[arg(long)]
        alt: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PlannerConfig::load(path)?,
        None => PlannerConfig::default(),
    };
    if let Some(dir) = &cli.dir {
        config.data_dir = dir.clone();
    }

    match cli.command {
        Commands::Plan {
            request,
            provider,
            title,
        } => {
            tracing::info!(request = %request, provider = %provider, "Creating plan");
            orchestrator::run_plan(&config, &provider, &request, title.as_deref())?;
        }
        Commands::List => {
            tracing::info!(dir = %config.data_dir, "Listing results");
            orchestrator::list_results(&config)?;
        }
        Commands::Show {
            result_id,
            format,
            lat,
            lng,
        } => {
            tracing::info!(result_id = %result_id, format = %format, "Showing result");
            let origin = lat.zip(lng).map(|(lat, lng)| Coordinates { lat, lng });
            orchestrator::show_result(&config, &result_id, &format, origin)?;
        }
        Commands::Compare { result_id } => {
            tracing::info!(result_id = %result_id, "Comparing plans");
            orchestrator::compare_plans(&config, &result_id)?;
        }
        Commands::Optimize { result_id, mode } => {
            tracing::info!(result_id = %result_id, mode = ?mode, "Optimizing result");
            orchestrator::optimize_result(&config, &result_id, mode)?;
        }
        Commands::Own { result_id, item_id } => {
            tracing::info!(result_id = %result_id, item_id = %item_id, "Toggling owned");
            orchestrator::toggle_owned_item(&config, &result_id, &item_id)?;
        }
        Commands::UseAlt {
            result_id,
            item_id,
            alt,
        } => {
            tracing::info!(result_id = %result_id, item_id = %item_id, alt = alt, "Applying alternative");
            orchestrator::use_alternative(&config, &result_id, &item_id, alt)?;
        }
    }

    Ok(())
}
