//! In-memory tabular data: typed columns aligned on a shared row index.
//!
//! A [`Table`] is read once and never mutated in place. Computed columns and
//! row filters produce new tables; [`Row`] is a borrowed view used to build
//! features.

use std::fmt;

use crate::error::TableError;

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Missing marker
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Text value
    Str(String),
}

impl CellValue {
    /// Returns `true` for [`CellValue::Null`] and for NaN floats.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the cell. Text is parsed; booleans map to 0/1.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            #[allow(clippy::cast_precision_loss)]
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Float(v) if v.is_nan() => None,
            CellValue::Float(v) => Some(*v),
            CellValue::Str(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Borrow the text of a [`CellValue::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(true) => f.write_str("True"),
            CellValue::Bool(false) => f.write_str("False"),
            CellValue::Int(v) => write!(f, "{v}"),
            // Debug keeps the trailing ".0" on integral values (5.0, not 5)
            CellValue::Float(v) => write!(f, "{v:?}"),
            CellValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Str(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Str(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Text
    String,
    /// 64-bit integers
    Integer,
    /// 64-bit floats
    Float,
    /// Booleans
    Boolean,
}

impl ColumnType {
    /// Returns the string representation of this column type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column header
    pub name: String,
    /// Declared value type
    pub declared_type: ColumnType,
    /// Values in row order
    pub values: Vec<CellValue>,
}

impl Column {
    /// Creates a column from any iterator of cell-convertible values.
    pub fn new<I, V>(name: impl Into<String>, declared_type: ColumnType, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        Self {
            name: name.into(),
            declared_type,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered columns sharing one row index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Table {
    /// Builds a table, checking that names are unique and lengths agree.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::DuplicateColumn`] or [`TableError::LengthMismatch`].
    pub fn try_new(columns: Vec<Column>) -> Result<Self, TableError> {
        let num_rows = columns.first().map_or(0, |c| c.values.len());
        for (idx, column) in columns.iter().enumerate() {
            if columns[..idx].iter().any(|c| c.name == column.name) {
                return Err(TableError::DuplicateColumn {
                    column: column.name.clone(),
                });
            }
            if column.values.len() != num_rows {
                return Err(TableError::LengthMismatch {
                    column: column.name.clone(),
                    expected: num_rows,
                    found: column.values.len(),
                });
            }
        }
        Ok(Self { columns, num_rows })
    }

    /// Columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by exact name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Number of rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Returns `true` when the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// Returns a new table with `column` appended (or replacing a same-named column in place).
    ///
    /// # Errors
    ///
    /// Returns [`TableError::LengthMismatch`] when the column does not have one value per row.
    pub fn with_column(&self, column: Column) -> Result<Self, TableError> {
        if !self.columns.is_empty() && column.values.len() != self.num_rows {
            return Err(TableError::LengthMismatch {
                column: column.name,
                expected: self.num_rows,
                found: column.values.len(),
            });
        }
        let num_rows = column.values.len();
        let mut columns = self.columns.clone();
        match columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => columns.push(column),
        }
        Ok(Self { columns, num_rows })
    }

    /// Computes a column from each row and appends it.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `f`.
    pub fn derive_column<E, F>(
        &self,
        name: &str,
        declared_type: ColumnType,
        mut f: F,
    ) -> Result<Self, E>
    where
        F: FnMut(&Row<'_>) -> Result<CellValue, E>,
        E: From<TableError>,
    {
        let values = self.rows().map(|row| f(&row)).collect::<Result<Vec<_>, E>>()?;
        Ok(self.with_column(Column {
            name: name.to_string(),
            declared_type,
            values,
        })?)
    }

    /// Keeps the rows for which `predicate` returns `true`, preserving order.
    #[must_use]
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&Row<'_>) -> bool,
    {
        let keep: Vec<usize> = self
            .rows()
            .filter(|row| predicate(row))
            .map(|row| row.index())
            .collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                declared_type: c.declared_type,
                values: keep.iter().map(|&i| c.values[i].clone()).collect(),
            })
            .collect();
        Self {
            columns,
            num_rows: keep.len(),
        }
    }

    /// Iterates rows in original order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.num_rows).map(move |index| Row { table: self, index })
    }
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    /// Zero-based row index within the table.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value of the named column, if the column exists.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a CellValue> {
        self.table.column(name).map(|c| &c.values[self.index])
    }

    /// Value of a required column.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::MissingColumn`] when the column does not exist.
    pub fn require(&self, name: &str) -> Result<&'a CellValue, TableError> {
        self.get(name).ok_or_else(|| TableError::MissingColumn {
            column: name.to_string(),
        })
    }

    /// `(name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a CellValue)> + 'a {
        let index = self.index;
        self.table
            .columns
            .iter()
            .map(move |c| (c.name.as_str(), &c.values[index]))
    }

    /// Copies the row into an owned property map.
    #[must_use]
    pub fn to_properties(&self) -> crate::feature::Properties {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::try_new(vec![
            Column::new("Name", ColumnType::String, ["a", "b", "c"]),
            Column::new("MHz", ColumnType::Float, [Some(5.0), None, Some(12.6)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_rows_follow_input_order() {
        let table = sample();
        let names: Vec<String> = table
            .rows()
            .map(|r| r.get("Name").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(table.num_rows(), 3);
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = Table::try_new(vec![
            Column::new("a", ColumnType::Integer, [1_i64]),
            Column::new("a", ColumnType::Integer, [2_i64]),
        ]);
        assert_eq!(
            result.unwrap_err(),
            TableError::DuplicateColumn {
                column: "a".to_string()
            }
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = Table::try_new(vec![
            Column::new("a", ColumnType::Integer, [1_i64, 2]),
            Column::new("b", ColumnType::Integer, [1_i64]),
        ]);
        assert!(matches!(result, Err(TableError::LengthMismatch { .. })));
    }

    #[test]
    fn test_with_column_leaves_original_untouched() {
        let table = sample();
        let extended = table
            .with_column(Column::new("flag", ColumnType::Boolean, [true, false, true]))
            .unwrap();
        assert_eq!(table.columns().len(), 2);
        assert_eq!(extended.columns().len(), 3);
        assert_eq!(extended.column("flag").unwrap().values[1], CellValue::Bool(false));
    }

    #[test]
    fn test_derive_column() {
        let table = sample();
        let derived = table
            .derive_column::<TableError, _>("label", ColumnType::String, |row| {
                Ok(CellValue::Str(format!("{} MHz", row.require("MHz")?)))
            })
            .unwrap();
        let labels = &derived.column("label").unwrap().values;
        assert_eq!(labels[0], CellValue::from("5.0 MHz"));
        assert_eq!(labels[1], CellValue::from(" MHz"));
    }

    #[test]
    fn test_filter_rows() {
        let table = sample();
        let filtered = table.filter_rows(|row| !row.get("MHz").unwrap().is_missing());
        assert_eq!(filtered.num_rows(), 2);
        assert_eq!(
            filtered.column("Name").unwrap().values,
            vec![CellValue::from("a"), CellValue::from("c")]
        );
    }

    #[test]
    fn test_require_missing_column() {
        let table = sample();
        let row = table.rows().next().unwrap();
        assert!(matches!(
            row.require("Status"),
            Err(TableError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Float(5.0).to_string(), "5.0");
        assert_eq!(CellValue::Float(12.6).to_string(), "12.6");
        assert_eq!(CellValue::Int(16).to_string(), "16");
        assert_eq!(CellValue::Bool(true).to_string(), "True");
        assert_eq!(CellValue::Null.to_string(), "");
    }

    #[test]
    fn test_missing_and_numeric_views() {
        assert!(CellValue::Float(f64::NAN).is_missing());
        assert!(CellValue::Null.is_missing());
        assert!(!CellValue::Int(0).is_missing());
        assert_eq!(CellValue::from(" 8.3 ").as_f64(), Some(8.3));
        assert_eq!(CellValue::Float(f64::NAN).as_f64(), None);
    }
}
