//! CSV input for `stationgeo`.
//!
//! Reads station metadata tables into the shared [`Table`] model, inferring
//! a [`ColumnType`] for every column from its cells.
//!
//! [`Table`]: stationgeo_core_common::table::Table
//! [`ColumnType`]: stationgeo_core_common::table::ColumnType

pub mod reader;

pub use reader::{CsvReaderOptions, infer_column_type, read_table, read_table_file};
