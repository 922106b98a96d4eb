mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use wardrobe_lib::WardrobeConfig;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "wardrobe")]
#[command(about = "Harvest purchase history and classify the garments in it")]
struct Cli {
    /// Output format: table, json, csv or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// TOML config file (defaults are used for anything it leaves out)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in through a browser and scrape the purchase-history page
    Harvest(commands::harvest::HarvestArgs),
    /// Run the harvest pipeline against a recorded page fixture
    Replay(commands::replay::ReplayArgs),
    /// Classify a previously saved raw purchase CSV
    Classify(commands::classify::ClassifyArgs),
    /// Check that the WebDriver server is up
    CheckDriver,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wardrobe=info".parse()?)
                .add_directive("wardrobe_lib=info".parse()?)
                .add_directive("purchase_scraper=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);
    let config = WardrobeConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Harvest(args) => commands::harvest::run(args, &config, &format).await?,
        Commands::Replay(args) => commands::replay::run(args, &config, &format).await?,
        Commands::Classify(args) => commands::classify::run(args, &config, &format)?,
        Commands::CheckDriver => commands::check_driver::run(&config, &format).await?,
    }

    Ok(())
}
