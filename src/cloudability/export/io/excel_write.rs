use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet};
use tracing::{debug, info};

use crate::cloudability::export::error::Result;
use crate::cloudability::export::model::{CellValue, ProviderExport, Table};

/// Number of data rows written per batch unless overridden.
pub const DEFAULT_BATCH_ROWS: usize = 100_000;

/// Number of leading rows sampled when sizing columns, to avoid scanning
/// multi-million-row tables in full.
const WIDTH_SAMPLE_ROWS: usize = 1_000;
const WIDTH_PADDING: f64 = 2.0;

/// Writes one worksheet per provider into a workbook at `path`.
///
/// Each worksheet carries a styled header row followed by the provider's
/// data rows. Rows go in fixed-size batches of `batch_rows`, each batch
/// continuing from the offset where the previous one stopped, so the sheet
/// holds exactly one header row plus one row per table row regardless of
/// batch size. Any failure aborts the whole export; the file is only saved
/// once every worksheet was written.
pub fn write_report(path: &Path, export: &ProviderExport, batch_rows: usize) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x00D3_D3D3))
        .set_border(FormatBorder::Thin);

    for (provider, table) in export {
        let provider = provider.as_str();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet_name_for(provider))?;

        for (col_idx, header) in table.columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col_idx as u16, header, &header_format)?;
        }

        write_rows_batched(worksheet, table, batch_rows)?;
        autosize_columns(worksheet, table)?;

        info!(provider, rows = table.rows.len(), "worksheet written");
    }

    workbook.save(path)?;
    Ok(())
}

/// Appends the table's data rows below the header, `batch_rows` at a time,
/// each batch continuing from the correct row offset.
fn write_rows_batched(worksheet: &mut Worksheet, table: &Table, batch_rows: usize) -> Result<()> {
    let batch_rows = batch_rows.max(1);
    let total = table.rows.len();
    let mut start = 0;

    while start < total {
        let end = (start + batch_rows).min(total);
        for (offset, row) in table.rows[start..end].iter().enumerate() {
            // Row 0 is the header.
            let row_idx = (start + offset + 1) as u32;
            for (col_idx, cell) in row.iter().enumerate() {
                write_cell(worksheet, row_idx, col_idx as u16, cell)?;
            }
        }
        debug!(start, end, "batch written");
        start = end;
    }

    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &CellValue) -> Result<()> {
    match cell {
        CellValue::Empty => {}
        CellValue::Bool(value) => {
            worksheet.write_boolean(row, col, *value)?;
        }
        CellValue::Text(value) => {
            worksheet.write_string(row, col, value)?;
        }
        numeric => {
            if let Some(value) = numeric.as_f64() {
                worksheet.write_number(row, col, value)?;
            }
        }
    }
    Ok(())
}

/// Sizes each column from the header and a bounded prefix of the data rows:
/// width = max(header length, longest stringified sampled value) + padding.
fn autosize_columns(worksheet: &mut Worksheet, table: &Table) -> Result<()> {
    for (col_idx, header) in table.columns.iter().enumerate() {
        let mut max_len = header.chars().count();
        for row in table.rows.iter().take(WIDTH_SAMPLE_ROWS) {
            if let Some(cell) = row.get(col_idx) {
                max_len = max_len.max(cell.to_string().chars().count());
            }
        }
        worksheet.set_column_width(col_idx as u16, max_len as f64 + WIDTH_PADDING)?;
    }
    Ok(())
}

/// Derives the worksheet name for a provider: lower-cased, `_data`-suffixed,
/// and sanitized to Excel's sheet naming rules.
pub fn sheet_name_for(provider: &str) -> String {
    sanitize_sheet_name(&format!("{}_data", provider.to_lowercase()))
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
        sanitized = "sheet".to_string();
    }

    if sanitized.len() > 31 {
        // Cut on a character boundary; byte 31 may fall inside a multi-byte
        // character.
        let mut cut = 31;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
    }

    sanitized
}
