use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Column name carrying the per-view category tag. It is always the first
/// column of a non-empty [`Table`].
pub const CATEGORY_COLUMN: &str = "category";

/// Represents a single spreadsheet cell value.
///
/// Integer and float values carry their storage width so that large report
/// tables can be narrowed to the smallest lossless representation (see
/// [`Table::narrow_numeric_columns`]).
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Absent value; a column the originating record did not provide.
    Empty,
    /// Boolean literal.
    Bool(bool),
    /// Integer narrowed to 8 bits.
    Int8(i8),
    /// Integer narrowed to 16 bits.
    Int16(i16),
    /// Integer narrowed to 32 bits.
    Int32(i32),
    /// Full-width integer literal.
    Int(i64),
    /// Float narrowed to 32 bits.
    Float32(f32),
    /// Full-width floating point literal.
    Float(f64),
    /// Plain string literal.
    Text(String),
}

impl CellValue {
    /// Converts a JSON value into a cell. Nested mappings and arrays are kept
    /// as their JSON text representation rather than being flattened.
    pub fn from_json(value: &Value) -> CellValue {
        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(flag) => CellValue::Bool(*flag),
            Value::Number(number) => match number.as_i64() {
                Some(integer) => CellValue::Int(integer),
                None => CellValue::Float(number.as_f64().unwrap_or_default()),
            },
            Value::String(text) => CellValue::Text(text.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// Returns the numeric content as an `f64`, if the cell is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int8(value) => Some(f64::from(*value)),
            CellValue::Int16(value) => Some(f64::from(*value)),
            CellValue::Int32(value) => Some(f64::from(*value)),
            CellValue::Int(value) => Some(*value as f64),
            CellValue::Float32(value) => Some(f64::from(*value)),
            CellValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int8(value) => Some(i64::from(*value)),
            CellValue::Int16(value) => Some(i64::from(*value)),
            CellValue::Int32(value) => Some(i64::from(*value)),
            CellValue::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(value) => write!(f, "{value}"),
            CellValue::Int8(value) => write!(f, "{value}"),
            CellValue::Int16(value) => write!(f, "{value}"),
            CellValue::Int32(value) => write!(f, "{value}"),
            CellValue::Int(value) => write!(f, "{value}"),
            CellValue::Float32(value) => write!(f, "{value}"),
            CellValue::Float(value) => write!(f, "{value}"),
            CellValue::Text(value) => write!(f, "{value}"),
        }
    }
}

/// A dense, column-consistent table. Every row holds exactly
/// `columns.len()` cells; cells a source record lacked are
/// [`CellValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Returns true when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Narrows each numeric column to the smallest representation that
    /// preserves every value.
    ///
    /// Homogeneous integer columns shrink to the smallest of
    /// i8/i16/i32/i64 that holds the full range; homogeneous float columns
    /// shrink to f32 when the f64 → f32 → f64 round-trip is exact for every
    /// value. Columns that mix types, or where narrowing would lose
    /// precision, are left untouched.
    pub fn narrow_numeric_columns(&mut self) {
        for col in 0..self.columns.len() {
            match classify_column(self.rows.iter().filter_map(|row| row.get(col))) {
                ColumnKind::Integer { min, max } => {
                    if let Some(narrow) = integer_narrower(min, max) {
                        for row in &mut self.rows {
                            if let Some(integer) = row[col].as_i64() {
                                row[col] = narrow(integer);
                            }
                        }
                    }
                }
                ColumnKind::Float => {
                    let lossless = self.rows.iter().all(|row| match &row[col] {
                        CellValue::Float(value) => f64::from(*value as f32) == *value,
                        _ => true,
                    });
                    if lossless {
                        for row in &mut self.rows {
                            if let CellValue::Float(value) = row[col] {
                                row[col] = CellValue::Float32(value as f32);
                            }
                        }
                    }
                }
                ColumnKind::Other => {}
            }
        }
    }
}

/// Aggregated tables keyed by provider name, ready for export. Providers
/// without any non-empty view result never gain an entry.
pub type ProviderExport = BTreeMap<String, Table>;

enum ColumnKind {
    Integer { min: i64, max: i64 },
    Float,
    Other,
}

/// Classifies a column as homogeneous integer, homogeneous float, or
/// anything else. Empty cells do not affect the classification.
fn classify_column<'a>(cells: impl Iterator<Item = &'a CellValue>) -> ColumnKind {
    let mut int_range: Option<(i64, i64)> = None;
    let mut has_floats = false;

    for cell in cells {
        match cell {
            CellValue::Empty => {}
            CellValue::Int(value) => {
                if has_floats {
                    return ColumnKind::Other;
                }
                int_range = Some(match int_range {
                    Some((min, max)) => (min.min(*value), max.max(*value)),
                    None => (*value, *value),
                });
            }
            CellValue::Float(_) => {
                if int_range.is_some() {
                    return ColumnKind::Other;
                }
                has_floats = true;
            }
            _ => return ColumnKind::Other,
        }
    }

    match (int_range, has_floats) {
        (Some((min, max)), false) => ColumnKind::Integer { min, max },
        (None, true) => ColumnKind::Float,
        _ => ColumnKind::Other,
    }
}

fn integer_narrower(min: i64, max: i64) -> Option<fn(i64) -> CellValue> {
    if min >= i64::from(i8::MIN) && max <= i64::from(i8::MAX) {
        Some(|value| CellValue::Int8(value as i8))
    } else if min >= i64::from(i16::MIN) && max <= i64::from(i16::MAX) {
        Some(|value| CellValue::Int16(value as i16))
    } else if min >= i64::from(i32::MIN) && max <= i64::from(i32::MAX) {
        Some(|value| CellValue::Int32(value as i32))
    } else {
        None
    }
}
