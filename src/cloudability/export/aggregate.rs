use std::collections::HashMap;

use crate::cloudability::export::model::{CellValue, Table};

/// Concatenates the normalized tables of one provider's views into a single
/// table, preserving row order of appearance.
///
/// The result's column set is the union of the input column sets in
/// first-seen order; since every non-empty input places `category` first,
/// it stays first in the union. Rows originating from a table that lacked a
/// column receive [`CellValue::Empty`] for it.
///
/// An empty input sequence yields `None`: a provider with zero usable views
/// is omitted from the export rather than contributing an empty worksheet.
pub fn aggregate(tables: Vec<Table>) -> Option<Table> {
    if tables.is_empty() {
        return None;
    }

    let mut columns: Vec<String> = Vec::new();
    for table in &tables {
        for column in &table.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
    }

    let index_of: HashMap<String, usize> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| (column.clone(), index))
        .collect();

    let total_rows = tables.iter().map(|table| table.rows.len()).sum();
    let mut rows: Vec<Vec<CellValue>> = Vec::with_capacity(total_rows);

    for table in tables {
        let mapping: Vec<usize> = table
            .columns
            .iter()
            .map(|column| index_of[column])
            .collect();
        for row in table.rows {
            let mut cells = vec![CellValue::Empty; columns.len()];
            for (source_index, cell) in row.into_iter().enumerate() {
                cells[mapping[source_index]] = cell;
            }
            rows.push(cells);
        }
    }

    Some(Table { columns, rows })
}
