use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use wardrobe_lib::purchase_scraper::{ExtractionFailure, RawPurchaseRecord};
use wardrobe_lib::{HarvestSummary, NormalizedGarment};

/// Spreadsheet tools only detect UTF-8 with this prefix.
const UTF8_BOM: &str = "\u{feff}";

pub const RAW_COLUMNS: [&str; 5] = ["title", "specification", "image_url", "price", "status"];

pub const GARMENT_COLUMNS: [&str; 11] = [
    "title",
    "specification",
    "image_url",
    "price",
    "status",
    "type",
    "style",
    "exposure_level",
    "color",
    "size",
    "is_clothing",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(name: &str) -> Self {
        match name {
            "json" => Self::Json,
            "csv" => Self::Csv,
            "markdown" | "md" => Self::Markdown,
            _ => Self::Table,
        }
    }
}

#[derive(Tabled)]
struct GarmentRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Type")]
    garment_type: String,
    #[tabled(rename = "Style")]
    style: String,
    #[tabled(rename = "Exposure")]
    exposure: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "Group")]
    container: usize,
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

fn build_garment_rows(garments: &[NormalizedGarment]) -> Vec<GarmentRow> {
    garments
        .iter()
        .map(|g| GarmentRow {
            title: truncate(&g.title, 30),
            garment_type: g.garment_type.to_string(),
            style: g.style.clone(),
            exposure: g.exposure_level.to_string(),
            color: g.color.clone(),
            size: g.size.clone(),
            price: g.price.clone(),
            status: g.status.clone(),
        })
        .collect()
}

fn build_failure_rows(failures: &[ExtractionFailure]) -> Vec<FailureRow> {
    failures
        .iter()
        .map(|f| FailureRow {
            container: f.container,
            item: f.row.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
            field: f.field.map(|x| x.to_string()).unwrap_or_else(|| "-".into()),
            reason: f.reason.clone(),
        })
        .collect()
}

/// Shorten to `max` characters, marking the cut with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

// -- stdout --

pub fn print_garments(garments: &[NormalizedGarment], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(build_garment_rows(garments))),
        OutputFormat::Markdown => {
            let mut table = Table::new(build_garment_rows(garments));
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Json => print_json(&garments),
        OutputFormat::Csv => {
            let stdout = std::io::stdout();
            write_csv(stdout.lock(), &GARMENT_COLUMNS, garments)?;
        }
    }
    Ok(())
}

pub fn print_failures_table(failures: &[ExtractionFailure]) {
    if failures.is_empty() {
        return;
    }
    eprintln!("Skipped {} order groups/items:", failures.len());
    eprintln!("{}", Table::new(build_failure_rows(failures)));
}

pub fn print_summary(summary: &HarvestSummary) {
    eprintln!(
        "Scraped {} items from {} order groups at {} (window since {}): {} usable, {} dropped, {} skipped",
        summary.records,
        summary.containers,
        summary.scraped_at.format("%Y-%m-%d %H:%M:%S UTC"),
        summary.window_start,
        summary.usable,
        summary.dropped,
        summary.failures,
    );
}

pub fn print_json<T: Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

// -- CSV files --

/// Write rows under a fixed header. The header is written even when there
/// are no rows.
pub fn write_csv<W: Write, T: Serialize>(writer: W, header: &[&str], rows: &[T]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_csv_file<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM.as_bytes())?;
    write_csv(out, header, rows).with_context(|| format!("writing {}", path.display()))
}

pub fn write_garments_csv(path: &Path, garments: &[NormalizedGarment]) -> Result<()> {
    write_csv_file(path, &GARMENT_COLUMNS, garments)
}

pub fn write_raw_csv(path: &Path, records: &[RawPurchaseRecord]) -> Result<()> {
    write_csv_file(path, &RAW_COLUMNS, records)
}

/// Parse a raw purchase CSV, with or without a leading BOM.
pub fn parse_raw_csv(text: &str) -> Result<Vec<RawPurchaseRecord>> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let mut rdr = csv::Reader::from_reader(text.as_bytes());
    let mut records = Vec::new();
    for (i, row) in rdr.deserialize().enumerate() {
        let record: RawPurchaseRecord = row.with_context(|| format!("row {}", i + 1))?;
        records.push(record);
    }
    Ok(records)
}

pub fn read_raw_csv(path: &Path) -> Result<Vec<RawPurchaseRecord>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_raw_csv(&text).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wardrobe_lib::purchase_scraper::RecordField;
    use wardrobe_lib::Normalizer;

    fn raw(title: &str, spec: &str) -> RawPurchaseRecord {
        RawPurchaseRecord {
            title: title.into(),
            specification: spec.into(),
            image_url: "//img.example.com/x.jpg_80x80.jpg".into(),
            price: "￥59.00".into(),
            status: "交易成功".into(),
        }
    }

    fn to_string<T: Serialize>(header: &[&str], rows: &[T]) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, header, rows).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn format_parse_defaults_to_table() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("md"), OutputFormat::Markdown);
        assert_eq!(OutputFormat::parse("xml"), OutputFormat::Table);
    }

    #[test]
    fn garment_csv_column_order() {
        let n = Normalizer::builtin().unwrap();
        let g = n.normalize(&raw("纯棉T恤[交易快照]", "颜色分类:白色 尺码:L"));
        let text = to_string(&GARMENT_COLUMNS, &[g]);
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "title,specification,image_url,price,status,type,style,exposure_level,color,size,is_clothing"
        );
        assert_eq!(
            lines.next().unwrap(),
            "纯棉T恤,颜色分类:白色 尺码:L,//img.example.com/x.jpg_640x640.jpg,￥59.00,交易成功,top,unknown,unknown,白色,L,true"
        );
    }

    #[test]
    fn empty_csv_still_has_header() {
        let rows: Vec<NormalizedGarment> = Vec::new();
        assert_eq!(to_string(&GARMENT_COLUMNS, &rows).lines().count(), 1);
    }

    #[test]
    fn raw_csv_reads_back_with_bom() {
        let records = vec![raw("a, \"quoted\"", "尺码:M"), raw("b", "")];
        let text = format!("{}{}", UTF8_BOM, to_string(&RAW_COLUMNS, &records));
        assert_eq!(parse_raw_csv(&text).unwrap(), records);
    }

    #[test]
    fn raw_csv_missing_column_is_error() {
        assert!(parse_raw_csv("title,price\nx,1\n").is_err());
    }

    #[test]
    fn garment_rows_truncate_long_titles() {
        let n = Normalizer::builtin().unwrap();
        let g = n.normalize(&raw(&"长".repeat(40), ""));
        let rows = build_garment_rows(&[g]);
        assert_eq!(rows[0].title.chars().count(), 30);
        assert!(rows[0].title.ends_with('…'));
        assert_eq!(rows[0].garment_type, "unknown");
    }

    #[test]
    fn failure_rows_mark_container_failures() {
        let rows = build_failure_rows(&[
            ExtractionFailure::container(2, "stale element"),
            ExtractionFailure::item(0, 3, Some(RecordField::Price), "element not found"),
        ]);
        assert_eq!(rows[0].item, "-");
        assert_eq!(rows[0].field, "-");
        assert_eq!(rows[1].item, "3");
        assert_eq!(rows[1].field, "price");
    }
}
