use std::io::Cursor;

use calamine::{DataType, Reader, open_workbook_auto_from_rs};
use tracing::{debug, instrument};

use crate::config::{HeaderSource, ParseOptions};
use crate::error::{MergeError, Result, SourceSide};
use crate::model::RawRow;

/// xlsx and ods files are zip archives.
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";
/// Legacy xls files are OLE compound documents.
const CFB_SIGNATURE: &[u8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Container format of an input export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// UTF-8 delimited text.
    Delimited,
    /// Binary workbook (xlsx, xlsb, xls or ods); only the first worksheet is
    /// read.
    Spreadsheet,
}

impl InputFormat {
    /// Sniffs the format from the leading bytes.
    pub fn detect(raw: &[u8]) -> Self {
        if raw.starts_with(ZIP_SIGNATURE) || raw.starts_with(CFB_SIGNATURE) {
            InputFormat::Spreadsheet
        } else {
            InputFormat::Delimited
        }
    }
}

/// Parses an export into rows keyed by header, in file order.
///
/// Blank lines are skipped, short lines are padded with empty cells and
/// cells beyond the last header are discarded.
#[instrument(level = "debug", skip(raw, parsing), fields(bytes = raw.len()))]
pub fn parse(
    raw: &[u8],
    format: InputFormat,
    header: &HeaderSource,
    parsing: &ParseOptions,
    side: SourceSide,
) -> Result<Vec<RawRow>> {
    let grid = match format {
        InputFormat::Spreadsheet => read_spreadsheet(raw, side)?,
        InputFormat::Delimited if parsing.legacy_split => {
            read_split_lines(decode(raw, side)?, parsing.delimiter)
        }
        InputFormat::Delimited => read_delimited(decode(raw, side)?, parsing.delimiter, side)?,
    };
    Ok(rows_from_grid(grid, header))
}

fn decode(raw: &[u8], side: SourceSide) -> Result<&str> {
    let text = std::str::from_utf8(raw)
        .map_err(|error| MergeError::parse(side, format!("input is not valid UTF-8: {error}")))?;
    Ok(text.trim_start_matches('\u{feff}'))
}

fn read_delimited(text: &str, delimiter: char, side: SourceSide) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(text.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|error| MergeError::parse(side, error.to_string()))?;
        grid.push(record.iter().map(str::to_string).collect());
    }
    Ok(grid)
}

/// Legacy behaviour: every delimiter splits, quotes included.
fn read_split_lines(text: &str, delimiter: char) -> Vec<Vec<String>> {
    text.lines()
        .map(|line| line.split(delimiter).map(str::to_string).collect())
        .collect()
}

fn read_spreadsheet(raw: &[u8], side: SourceSide) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(raw))
        .map_err(|error| MergeError::parse(side, format!("unreadable workbook: {error}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| MergeError::parse(side, "workbook has no worksheets"))?
        .map_err(|error| MergeError::parse(side, format!("unreadable worksheet: {error}")))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell_to_string(Some(cell))).collect())
        .collect())
}

fn rows_from_grid(grid: Vec<Vec<String>>, header: &HeaderSource) -> Vec<RawRow> {
    let mut lines = grid
        .into_iter()
        .filter(|cells| cells.iter().any(|cell| !cell.trim().is_empty()));

    let headers: Vec<String> = match header {
        HeaderSource::FirstRow => match lines.next() {
            Some(cells) => cells.iter().map(|cell| clean_header(cell)).collect(),
            None => return Vec::new(),
        },
        HeaderSource::Explicit { columns } => columns.iter().map(|c| clean_header(c)).collect(),
    };

    let mut rows = Vec::new();
    for (line, cells) in lines.enumerate() {
        if cells.len() > headers.len() {
            debug!(
                line,
                extra = cells.len() - headers.len(),
                "discarding cells beyond the last header"
            );
        }
        let row: RawRow = headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !header.is_empty())
            .map(|(position, header)| {
                let value = cells.get(position).cloned().unwrap_or_default();
                (header.clone(), value)
            })
            .collect();
        if !row.is_blank() {
            rows.push(row);
        }
    }
    rows
}

fn clean_header(raw: &str) -> String {
    raw.trim_matches('\u{feff}').trim().to_string()
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_text(text: &str, parsing: &ParseOptions) -> Vec<RawRow> {
        parse(
            text.as_bytes(),
            InputFormat::Delimited,
            &HeaderSource::FirstRow,
            parsing,
            SourceSide::Primary,
        )
        .expect("delimited text parsed")
    }

    #[test]
    fn quoted_delimiters_stay_inside_the_field() {
        let rows = parse_text(
            "Name,SKU,Stock\n\"Tea, green\",T1,4\n",
            &ParseOptions::default(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Name"), Some("Tea, green"));
        assert_eq!(rows[0].get("Stock"), Some("4"));
    }

    #[test]
    fn legacy_split_reproduces_the_shifted_columns() {
        let parsing = ParseOptions {
            legacy_split: true,
            ..ParseOptions::default()
        };
        let rows = parse_text("Name,SKU,Stock\n\"Tea, green\",T1,4\n", &parsing);
        assert_eq!(rows[0].get("Name"), Some("\"Tea"));
        assert_eq!(rows[0].get("SKU"), Some(" green\""));
    }

    #[test]
    fn blank_lines_are_skipped_and_short_lines_padded() {
        let rows = parse_text(
            "\u{feff}Name,SKU,Stock\n\nTea,T1\n,,\nCoffee,C1,2,extra\n",
            &ParseOptions::default(),
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Name"), Some("Tea"));
        assert_eq!(rows[0].get("Stock"), Some(""));
        assert_eq!(rows[1].get("Name"), Some("Coffee"));
        assert_eq!(rows[1].len(), 3);
    }

    #[test]
    fn explicit_headers_treat_every_line_as_data() {
        let header = HeaderSource::Explicit {
            columns: vec!["Title".to_string(), "SKU".to_string()],
        };
        let rows = parse(
            b"Tea;t1\nCoffee;c1\n",
            InputFormat::Delimited,
            &header,
            &ParseOptions {
                delimiter: ';',
                legacy_split: false,
            },
            SourceSide::Secondary,
        )
        .expect("parsed");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("SKU"), Some("c1"));
    }

    #[test]
    fn workbook_signatures_are_recognised() {
        assert_eq!(
            InputFormat::detect(b"PK\x03\x04garbage"),
            InputFormat::Spreadsheet
        );
        assert_eq!(
            InputFormat::detect(b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1garbage"),
            InputFormat::Spreadsheet
        );
        assert_eq!(InputFormat::detect(b"Name,SKU\n"), InputFormat::Delimited);
    }

    #[test]
    fn corrupt_legacy_workbook_is_not_read_as_text() {
        let raw = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1garbage";
        let error = parse(
            raw,
            InputFormat::detect(raw),
            &HeaderSource::FirstRow,
            &ParseOptions::default(),
            SourceSide::Primary,
        )
        .expect_err("corrupt workbook rejected");
        match error {
            MergeError::Parse { side, reason } => {
                assert_eq!(side, SourceSide::Primary);
                assert!(!reason.contains("UTF-8"), "unexpected reason: {reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn corrupt_workbook_is_a_parse_error() {
        let error = parse(
            b"PK\x03\x04garbage",
            InputFormat::Spreadsheet,
            &HeaderSource::FirstRow,
            &ParseOptions::default(),
            SourceSide::Secondary,
        )
        .expect_err("corrupt workbook rejected");
        assert!(matches!(
            error,
            MergeError::Parse {
                side: SourceSide::Secondary,
                ..
            }
        ));
    }
}
