use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod plotting;
mod workflow;

#[derive(Parser)]
#[command(name = "citygas", version, about = "City GHG inventory results and ECRF reports")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "citygas-app/citygas.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sector breakdown and top emitting sub-sectors of an inventory.
    Results {
        inventory_id: String,
        /// Recompute cached totals in memory before aggregating.
        #[arg(long)]
        recompute: bool,
    },
    /// Fill the ECRF template with an inventory.
    Ecrf {
        inventory_id: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Recompute and save every cached emissions total of an inventory.
    Recompute {
        inventory_id: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// List the methodologies offered for a GPC reference number.
    Methodologies { reference: String },
    /// Check whether a draft slot (YAML) is complete.
    Check { reference: String, draft: PathBuf },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    println!("--- CityGas ---");
    let config = config::AppConfig::load(&cli.config)?;
    let gwp = config.gwp.table();

    match cli.command {
        Command::Results {
            inventory_id,
            recompute,
        } => {
            let run_dir = workflow::run_results(&config, &gwp, &inventory_id, recompute)?;
            println!("\nResults are in '{}'", run_dir.display());
        }
        Command::Ecrf { inventory_id, output } => {
            let renderer = config.renderer()?;
            let output = workflow::run_ecrf(&config, &renderer, &gwp, &inventory_id, output)?;
            println!("\nECRF written to '{}'", output.display());
        }
        Command::Recompute {
            inventory_id,
            dry_run,
        } => workflow::run_recompute(&config, &gwp, &inventory_id, dry_run)?,
        Command::Methodologies { reference } => {
            let catalog = config.load_catalog()?;
            workflow::list_methodologies(&catalog, &reference);
        }
        Command::Check { reference, draft } => {
            let catalog = config.load_catalog()?;
            if !workflow::check_draft(&catalog, &reference, &draft)? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
