use std::fs;
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::aggregate::aggregate;
use crate::config::{HeaderSource, MergeConfig, NoMatchPolicy, OutputFormat};
use crate::error::{MergeError, Result, SourceSide};
use crate::io::tabular_read::{self, InputFormat};
use crate::matching::match_records;
use crate::model::{MergeStats, MergedReport, PrimaryRecord, RawRow, SecondaryRecord};
use crate::normalize::{normalize_primary, normalize_secondary};
use crate::report::{emit, report_columns};

/// Reconciles two exports held in memory.
///
/// Either the whole report is produced or an error is returned; per-record
/// problems only ever degrade to zero stock or placeholders.
#[instrument(
    level = "info",
    skip_all,
    fields(primary_bytes = primary.len(), secondary_bytes = secondary.len())
)]
pub fn merge(primary: &[u8], secondary: &[u8], config: &MergeConfig) -> Result<MergedReport> {
    config.validate()?;

    let primary_rows = load_rows(primary, &config.primary.header, config, SourceSide::Primary)?;
    let secondary_rows = load_rows(
        secondary,
        &config.secondary.header,
        config,
        SourceSide::Secondary,
    )?;

    let sentinels = &config.stock_sentinels;
    let primaries: Vec<PrimaryRecord> = primary_rows
        .iter()
        .map(|row| normalize_primary(row, &config.primary, sentinels))
        .collect();
    let secondaries: Vec<SecondaryRecord> = secondary_rows
        .iter()
        .map(|row| normalize_secondary(row, &config.secondary, sentinels))
        .collect();

    let locations = config.secondary.stock.locations();
    let mut stats = MergeStats {
        primary_rows: primaries.len(),
        secondary_rows: secondaries.len(),
        ..MergeStats::default()
    };
    let mut records = Vec::with_capacity(primaries.len());

    for (primary, secondary) in match_records(&primaries, &secondaries, config.key) {
        if primary.identifier(config.key.primary).is_none() {
            stats.without_identifier += 1;
            debug!(name = %primary.name, "primary record has no identifier");
        }

        match (secondary, config.on_no_match) {
            (Some(_), _) => stats.matched += 1,
            (None, NoMatchPolicy::Drop) => {
                stats.dropped += 1;
                continue;
            }
            (None, NoMatchPolicy::Placeholder) => stats.placeholders += 1,
        }

        records.push(aggregate(primary, secondary, locations, config.key));
    }

    info!(
        matched = stats.matched,
        placeholders = stats.placeholders,
        dropped = stats.dropped,
        "merged stock records"
    );

    Ok(MergedReport {
        columns: report_columns(config),
        records,
        stats,
    })
}

fn load_rows(
    raw: &[u8],
    header: &HeaderSource,
    config: &MergeConfig,
    side: SourceSide,
) -> Result<Vec<RawRow>> {
    let format = InputFormat::detect(raw);
    let rows = tabular_read::parse(raw, format, header, &config.parsing, side)?;
    if rows.is_empty() {
        return Err(MergeError::NoData { side });
    }
    info!(%side, ?format, row_count = rows.len(), "parsed source rows");
    Ok(rows)
}

/// Reads both exports from disk, merges them and writes the report to
/// `output`. The output format comes from the configuration or, failing
/// that, from the output file extension.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn merge_files(
    primary: Option<&Path>,
    secondary: Option<&Path>,
    output: &Path,
    config: &MergeConfig,
) -> Result<MergedReport> {
    let primary = primary.ok_or(MergeError::MissingFile {
        side: SourceSide::Primary,
    })?;
    let secondary = secondary.ok_or(MergeError::MissingFile {
        side: SourceSide::Secondary,
    })?;
    for path in [primary, secondary] {
        if !path.exists() {
            return Err(MergeError::MissingInput(path.to_path_buf()));
        }
    }

    let primary_bytes = fs::read(primary)?;
    let secondary_bytes = fs::read(secondary)?;
    let report = merge(&primary_bytes, &secondary_bytes, config)?;

    let format = config
        .report
        .format
        .unwrap_or_else(|| OutputFormat::from_path(output));
    let bytes = emit(&report, &config.report, format)?;
    fs::write(output, bytes)?;
    debug!(?format, record_count = report.records.len(), "report written");
    Ok(report)
}
