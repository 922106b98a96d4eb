use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use wardrobe_lib::purchase_scraper::{FixtureDriver, PageFixture};
use wardrobe_lib::{harvest, HarvestPlan, WardrobeConfig};

use crate::output::{write_garments_csv, OutputFormat};

#[derive(Args)]
pub struct ReplayArgs {
    /// JSON page fixture to replay
    pub fixture: PathBuf,

    /// Write the classified clothing CSV here as well
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

/// Runs the same pipeline as `harvest`, with the browser replaced by the
/// fixture. Fixture timelines are replayed in real time.
pub async fn run(args: &ReplayArgs, config: &WardrobeConfig, format: &OutputFormat) -> Result<()> {
    let fixture = PageFixture::load(&args.fixture)
        .with_context(|| format!("loading fixture {}", args.fixture.display()))?;
    let plan = HarvestPlan::from_config(config);
    let driver = FixtureDriver::new(fixture, plan.selectors.clone());
    let normalizer = super::normalizer(config)?;

    let report = harvest(driver, &plan, &normalizer).await?;
    if let Some(path) = &args.csv {
        write_garments_csv(path, &report.garments())?;
    }
    super::report(&report, format)
}
