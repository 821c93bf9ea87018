use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reservectl::config::{self, Config};
use reservectl::fleet::{collect_fleet, FleetSnapshot};
use reservectl::pricing::{self, PriceSource};
use reservectl::retry::{ExponentialBackoffPolicy, RetryPolicy};
use reservectl::{aws, report};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reservectl")]
#[command(
    about = "Reserved instance coverage for EC2 fleets",
    long_about = "reservectl matches running EC2 instances against active reserved instances.\n\nEvery running, non-spot instance is reported as covered by a reservation\nor running at on-demand rates. Unused reservation capacity is listed\nseparately."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    output: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Match running instances against reservations
    Analyze {
        /// Read records from a saved snapshot instead of AWS
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Save the collected records as a snapshot
        #[arg(long)]
        save_snapshot: Option<PathBuf>,
    },
    /// Show on-demand prices by region and instance size
    Pricing {
        /// Only show this region
        #[arg(short, long)]
        region: Option<String>,
        /// Read the previous generation price table
        #[arg(long)]
        previous_generation: bool,
        /// Price column to show
        #[arg(long, default_value = "linux")]
        column: String,
        /// Currency to show
        #[arg(long, default_value = "USD")]
        currency: String,
    },
    /// Initialize configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = ".reservectl.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init { output } => {
            config::init_config(&output)?;
        }
        Commands::Analyze {
            snapshot,
            save_snapshot,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            let fleet = match snapshot {
                Some(path) => FleetSnapshot::load(&path)
                    .with_context(|| format!("Failed to read snapshot: {}", path.display()))?,
                None => {
                    let accounts = aws::connect_accounts(&config).await;
                    collect_fleet(&accounts).await?
                }
            };
            if let Some(path) = save_snapshot {
                fleet
                    .save(&path)
                    .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
                info!("Saved snapshot: {}", path.display());
            }

            let analysis = fleet.analyze()?;
            if cli.output == "json" {
                println!("{}", report::render_json(&analysis)?);
            } else {
                print!("{}", report::render_text(&analysis));
            }
        }
        Commands::Pricing {
            region,
            previous_generation,
            column,
            currency,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            let source = if previous_generation {
                PriceSource::PreviousGeneration
            } else {
                PriceSource::Current
            };
            let url = source.url(&config.pricing);
            let client = pricing::build_client(&config.pricing)?;
            let table = ExponentialBackoffPolicy::new(config.retry.max_attempts)
                .execute_with_retry(|| pricing::fetch_price_table(&client, url))
                .await?;
            let mut mapping = pricing::price_table_to_region_mapping(&table)?;
            if let Some(region) = &region {
                mapping.retain(|name, _| name == region);
                if mapping.is_empty() {
                    anyhow::bail!("Region '{}' not found in price table", region);
                }
            }

            if cli.output == "json" {
                println!("{}", serde_json::to_string_pretty(&mapping)?);
            } else {
                println!(
                    "{}",
                    report::render_prices(&mapping, region.as_deref(), &column, &currency)
                );
            }
        }
    }

    Ok(())
}
