//! Common types shared across the `stationgeo` crates.
//!
//! This crate holds the data model passed between the conversion pipelines and
//! the format crates: tables, features, the constrained property schema and
//! the error types they raise. Keeping it separate lets the format crates
//! depend on it without depending on `stationgeo-core`.

pub mod error;
pub mod feature;
pub mod schema;
pub mod table;

// Re-export commonly used types
pub use error::{FormatError, FormatResult, GeometryError, SchemaError, SourcePosition, TableError};
pub use feature::{Feature, GeoPoint, GeometryKind, Properties, fill_missing_with_zero};
pub use schema::{
    CollisionPolicy, FieldType, NameRule, PropertySchema, SchemaProjector, SchemaReport,
    infer_schema, project_row,
};
pub use table::{CellValue, Column, ColumnType, Row, Table};
