use anyhow::{bail, Result};
use wardrobe_lib::purchase_scraper::probe_status;
use wardrobe_lib::WardrobeConfig;

use crate::output::{print_json, OutputFormat};

pub async fn run(config: &WardrobeConfig, format: &OutputFormat) -> Result<()> {
    let url = &config.webdriver.url;
    let status = probe_status(url).await?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "url": url,
            "ready": status.ready,
            "message": status.message,
        })),
        _ => println!(
            "{}: {} ({})",
            url,
            if status.ready { "ready" } else { "not ready" },
            status.message
        ),
    }

    if !status.ready {
        bail!("WebDriver at {} is not ready", url);
    }
    Ok(())
}
