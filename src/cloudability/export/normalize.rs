use std::collections::BTreeMap;

use serde_json::Value;
use tracing::info;

use crate::cloudability::export::error::{ReportError, Result};
use crate::cloudability::export::model::{CATEGORY_COLUMN, CellValue, Table};

/// Converts one view's raw API response into a canonical [`Table`].
///
/// The response must carry a `data` field holding a sequence of record
/// objects. Field names are lower-cased with spaces replaced by underscores,
/// and every row is prepended with a `category` cell carrying the resolved
/// label. Column order is `category` first, then the remaining fields in
/// first-seen order across records. Numeric columns are narrowed afterwards
/// to bound memory on large responses.
///
/// An empty `data` sequence yields a valid zero-row table; a missing `data`
/// field is a schema error.
pub fn normalize(raw: &Value, provider: &str, view: &str, category: &str) -> Result<Table> {
    info!(provider, view, category, "normalizing report data");

    let data = raw
        .get("data")
        .ok_or_else(|| schema_error(view, "missing data field"))?;
    let records = data
        .as_array()
        .ok_or_else(|| schema_error(view, "data field is not a sequence"))?;

    if records.is_empty() {
        return Ok(Table::default());
    }

    let mut columns: Vec<String> = vec![CATEGORY_COLUMN.to_string()];
    let mut sparse_rows: Vec<BTreeMap<String, CellValue>> = Vec::with_capacity(records.len());

    for record in records {
        let object = record
            .as_object()
            .ok_or_else(|| schema_error(view, "record is not a mapping"))?;

        let mut row = BTreeMap::new();
        row.insert(
            CATEGORY_COLUMN.to_string(),
            CellValue::Text(category.to_string()),
        );

        for (field, value) in object {
            let column = clean_column_name(field);
            // The category tag wins over a record field of the same name.
            if column == CATEGORY_COLUMN {
                continue;
            }
            if !columns.contains(&column) {
                columns.push(column.clone());
            }
            row.insert(column, CellValue::from_json(value));
        }

        sparse_rows.push(row);
    }

    let rows = sparse_rows
        .into_iter()
        .map(|mut row| {
            columns
                .iter()
                .map(|column| row.remove(column).unwrap_or(CellValue::Empty))
                .collect()
        })
        .collect();

    let mut table = Table { columns, rows };
    table.narrow_numeric_columns();
    Ok(table)
}

fn clean_column_name(field: &str) -> String {
    field.to_lowercase().replace(' ', "_")
}

fn schema_error(view: &str, reason: &str) -> ReportError {
    ReportError::Schema {
        view: view.to_string(),
        reason: reason.to_string(),
    }
}
