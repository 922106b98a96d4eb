use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use wardrobe_lib::WardrobeConfig;

use crate::output::{print_garments, read_raw_csv, write_garments_csv, OutputFormat};

#[derive(Args)]
pub struct ClassifyArgs {
    /// Raw purchase CSV (title, specification, image_url, price, status)
    #[arg(long, default_value = "data/taobao_purchases.csv")]
    pub input: PathBuf,

    /// Where to write the classified clothing CSV
    #[arg(long, default_value = "data/processed_taobao_purchases.csv")]
    pub csv: PathBuf,

    /// Keep rows that fail the clothing check (flagged is_clothing=false)
    #[arg(long)]
    pub all: bool,
}

pub fn run(args: &ClassifyArgs, config: &WardrobeConfig, format: &OutputFormat) -> Result<()> {
    let normalizer = super::normalizer(config)?;
    let records = read_raw_csv(&args.input)?;
    tracing::info!("Read {} raw records from {}", records.len(), args.input.display());

    let garments = if args.all {
        normalizer.normalize_all(&records)
    } else {
        normalizer.usable(&records)
    };
    tracing::info!("{} of {} records kept", garments.len(), records.len());

    write_garments_csv(&args.csv, &garments)?;
    eprintln!("Saved {} rows to {}", garments.len(), args.csv.display());
    print_garments(&garments, format)
}
