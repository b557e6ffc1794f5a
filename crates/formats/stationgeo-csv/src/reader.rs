//! CSV reader materialising a [`Table`] with per-column type inference.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::debug;
use stationgeo_core_common::error::{FormatError, FormatResult, SourcePosition};
use stationgeo_core_common::table::{CellValue, Column, ColumnType, Table};

/// Options for CSV reading
#[derive(Debug, Clone)]
pub struct CsvReaderOptions {
    /// Column delimiter (default: b',')
    pub delimiter: u8,
    /// Whether the first record is a header row (default: true)
    pub has_header: bool,
}

impl Default for CsvReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
        }
    }
}

impl CsvReaderOptions {
    /// Create new reader options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set column delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether the first record is a header row
    #[must_use]
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }
}

/// Read a whole CSV document into a table.
///
/// Without a header row columns are named `column_0`, `column_1`, ...
///
/// # Errors
///
/// Returns [`FormatError::Parse`] for malformed records (with the record
/// position) or duplicate header names, and [`FormatError::Io`] when the
/// underlying reader fails.
pub fn read_table<R: Read>(reader: R, options: &CsvReaderOptions) -> FormatResult<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_header)
        .from_reader(reader);

    let headers: Option<Vec<String>> = if options.has_header {
        Some(
            csv_reader
                .headers()
                .map_err(csv_error)?
                .iter()
                .map(str::to_string)
                .collect(),
        )
    } else {
        None
    };

    let records = csv_reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_error)?;

    let names = headers.unwrap_or_else(|| {
        let width = records.first().map_or(0, csv::StringRecord::len);
        (0..width).map(|i| format!("column_{i}")).collect()
    });

    let columns: Vec<Column> = names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| build_column(name, &records, idx))
        .collect();

    debug!(
        "Read {} CSV records into {} columns",
        records.len(),
        columns.len()
    );

    Table::try_new(columns).map_err(|e| FormatError::Parse {
        message: e.to_string(),
        position: None,
        context: None,
    })
}

/// Read a CSV file into a table.
///
/// # Errors
///
/// Same as [`read_table`]; the file path is attached as context.
pub fn read_table_file(path: impl AsRef<Path>, options: &CsvReaderOptions) -> FormatResult<Table> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| FormatError::from(e).with_additional_context(path.display().to_string()))?;
    read_table(BufReader::new(file), options)
        .map_err(|e| e.with_additional_context(path.display().to_string()))
}

fn build_column(name: String, records: &[csv::StringRecord], idx: usize) -> Column {
    let raw: Vec<&str> = records.iter().map(|r| r.get(idx).unwrap_or("")).collect();
    let declared_type = infer_column_type(&raw);
    let values = raw.iter().map(|cell| parse_cell(cell, declared_type)).collect();
    Column {
        name,
        declared_type,
        values,
    }
}

/// Infer the type of a column from all of its cells.
///
/// Integers widen to floats when a cell is missing, booleans fall back to
/// strings; a column with no values at all is a float column.
#[must_use]
pub fn infer_column_type(cells: &[&str]) -> ColumnType {
    let mut has_missing = false;
    let mut total_values = 0;
    let mut all_int = true;
    let mut all_numeric = true;
    let mut all_bool = true;

    for cell in cells {
        let value = cell.trim();
        if value.is_empty() {
            has_missing = true;
            continue;
        }

        total_values += 1;
        all_int &= value.parse::<i64>().is_ok();
        all_numeric &= value.parse::<f64>().is_ok();
        all_bool &= is_bool(value);
    }

    if total_values == 0 {
        ColumnType::Float
    } else if all_int {
        if has_missing {
            ColumnType::Float
        } else {
            ColumnType::Integer
        }
    } else if all_numeric {
        ColumnType::Float
    } else if all_bool && !has_missing {
        ColumnType::Boolean
    } else {
        ColumnType::String
    }
}

fn is_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")
}

fn parse_cell(cell: &str, declared_type: ColumnType) -> CellValue {
    let value = cell.trim();
    if value.is_empty() {
        return CellValue::Null;
    }
    match declared_type {
        ColumnType::Integer => value.parse::<i64>().map_or(CellValue::Null, CellValue::Int),
        ColumnType::Float => value.parse::<f64>().map_or(CellValue::Null, CellValue::Float),
        ColumnType::Boolean => CellValue::Bool(value.eq_ignore_ascii_case("true")),
        ColumnType::String => CellValue::Str(cell.to_string()),
    }
}

fn csv_error(err: csv::Error) -> FormatError {
    let position = err.position().map(|pos| SourcePosition {
        line: Some(pos.line()),
        column: None,
        record: Some(pos.record()),
    });
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => FormatError::from(source),
        _ => FormatError::Parse {
            message,
            position,
            context: None,
        },
    }
}
