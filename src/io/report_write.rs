use rust_xlsxwriter::{Table, Workbook};

use crate::error::{MergeError, Result};
use crate::report::ReportTable;

/// Writes the table as comma-separated text with a header line.
pub fn write_csv(table: &ReportTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|error| MergeError::Io(error.into_error()))
}

/// Writes the table as a single-sheet workbook. Every cell is a string.
pub fn write_xlsx(table: &ReportTable) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&table.sheet_name)?;

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
        }
    }

    // A table needs at least one data row.
    if !table.rows.is_empty() {
        let mut excel_table = Table::new();
        excel_table.set_autofilter(true);
        let col_end = (table.columns.len() as u16).saturating_sub(1);
        worksheet.add_table(0, 0, table.rows.len() as u32, col_end, &excel_table)?;
    }

    Ok(workbook.save_to_buffer()?)
}
