//! CLI subcommand implementations.

pub mod check_driver;
pub mod classify;
pub mod harvest;
pub mod replay;

use anyhow::Result;
use wardrobe_lib::{HarvestReport, WardrobeConfig};

use crate::output::{print_failures_table, print_garments, print_summary, OutputFormat};

/// Build the normalizer from the configured keyword tables.
pub(crate) fn normalizer(config: &WardrobeConfig) -> Result<wardrobe_lib::Normalizer> {
    let taxonomy = config.taxonomy()?;
    Ok(wardrobe_lib::Normalizer::new(taxonomy)?)
}

/// Shared tail of `harvest` and `replay`.
pub(crate) fn report(report: &HarvestReport, format: &OutputFormat) -> Result<()> {
    print_garments(&report.garments(), format)?;
    print_failures_table(&report.failures);
    print_summary(&report.summary());
    Ok(())
}
