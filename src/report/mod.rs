//! Flattens merged records into a single report table.
//!
//! The column set depends only on the configuration, never on the rows, so
//! two runs with the same profile always produce the same header line.

use crate::config::{MergeConfig, OutputFormat, ReportOptions, StockLayout};
use crate::error::Result;
use crate::io::report_write;
use crate::model::{MergedRecord, MergedReport};

/// Text used for secondary descriptors of an unmatched record.
pub const NOT_AVAILABLE: &str = "N/A";

/// A table that will be materialised as a CSV file or a single Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Column headers in output order: descriptors, identifiers, primary stock,
/// optional per-location stock, then the totals.
pub fn report_columns(config: &MergeConfig) -> Vec<String> {
    let primary = &config.report.primary_label;
    let secondary = &config.report.secondary_label;

    let mut columns = vec![
        format!("{primary} Name"),
        format!("{secondary} Name"),
        "Variant".to_string(),
        format!("{primary} Identifier"),
        format!("{secondary} Identifier"),
        format!("{primary} Stock"),
    ];
    if let StockLayout::Locations { names } = &config.secondary.stock {
        columns.extend(names.iter().cloned());
    }
    columns.push(format!("{secondary} Stock"));
    columns.push("Combined Stock".to_string());
    columns
}

/// Converts the report into string cells; quantities are written as decimal
/// text.
pub fn build_table(report: &MergedReport, options: &ReportOptions) -> ReportTable {
    let rows = report.records.iter().map(record_cells).collect();
    ReportTable {
        sheet_name: sanitize_sheet_name(&options.sheet_name),
        columns: report.columns.clone(),
        rows,
    }
}

fn record_cells(record: &MergedRecord) -> Vec<String> {
    let or_placeholder =
        |value: &Option<String>| value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let mut cells = vec![
        record.primary_name.clone(),
        or_placeholder(&record.secondary_name),
        or_placeholder(&record.variant_label),
        record.primary_identifier.clone(),
        or_placeholder(&record.secondary_identifier),
        record.primary_stock.to_string(),
    ];
    if let Some(locations) = &record.per_location {
        cells.extend(locations.iter().map(|(_, quantity)| quantity.to_string()));
    }
    cells.push(record.secondary_stock_total.to_string());
    cells.push(record.combined_total.to_string());
    cells
}

/// Serializes the report into the bytes of a downloadable document.
pub fn emit(
    report: &MergedReport,
    options: &ReportOptions,
    format: OutputFormat,
) -> Result<Vec<u8>> {
    let table = build_table(report, options);
    match format {
        OutputFormat::Csv => report_write::write_csv(&table),
        OutputFormat::Xlsx => report_write::write_xlsx(&table),
    }
}

fn sanitize_sheet_name(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']', '\'', '"'];
    let mut sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    sanitized = sanitized.trim().to_string();
    if sanitized.is_empty() {
        sanitized = "Sheet".to_string();
    }

    // Excel caps sheet names at 31 characters.
    if sanitized.chars().count() > 31 {
        sanitized = sanitized.chars().take(31).collect();
    }

    sanitized
}
