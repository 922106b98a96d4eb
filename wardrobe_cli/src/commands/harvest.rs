use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use wardrobe_lib::purchase_scraper::WebDriverSession;
use wardrobe_lib::{harvest, HarvestPlan, WardrobeConfig};

use crate::output::{write_garments_csv, write_raw_csv, OutputFormat};

#[derive(Args)]
pub struct HarvestArgs {
    /// History window in days (logged; only the first rendered page is read)
    #[arg(long)]
    pub days: Option<u32>,

    /// Where to write the classified clothing CSV
    #[arg(long, default_value = "data/processed_taobao_purchases.csv")]
    pub csv: PathBuf,

    /// Also save the raw scrape to this CSV
    #[arg(long, default_value = "data/taobao_purchases.csv")]
    pub raw_csv: PathBuf,

    /// Skip writing the raw scrape
    #[arg(long)]
    pub no_raw: bool,

    /// Run the browser headless (the login QR code will not be visible)
    #[arg(long)]
    pub headless: bool,
}

pub async fn run(args: &HarvestArgs, config: &WardrobeConfig, format: &OutputFormat) -> Result<()> {
    let normalizer = super::normalizer(config)?;
    let mut plan = HarvestPlan::from_config(config);
    if let Some(days) = args.days {
        plan = plan.with_window_days(days);
    }

    let mut browser = config.browser_options();
    browser.headless |= args.headless;
    let driver = WebDriverSession::connect(&browser)
        .await
        .with_context(|| format!("connecting to WebDriver at {}", browser.webdriver_url))?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!(
        "waiting for login in the browser window (up to {}s)...",
        plan.session.login_timeout.as_secs()
    ));

    let result = harvest(driver, &plan, &normalizer).await;
    let report = match result {
        Ok(report) => {
            pb.finish_with_message(format!("read {} items", report.raw.len()));
            report
        }
        Err(e) => {
            pb.abandon_with_message(format!("harvest failed ({})", e.reason()));
            return Err(e.into());
        }
    };

    if !args.no_raw {
        write_raw_csv(&args.raw_csv, &report.raw)?;
        eprintln!("Raw records saved to {}", args.raw_csv.display());
    }
    write_garments_csv(&args.csv, &report.garments())?;
    eprintln!("Clothing saved to {}", args.csv.display());

    super::report(&report, format)
}
