//! Schema inference and row projection for attribute-constrained outputs.
//!
//! Legacy geometry/attribute containers cap field names at a fixed length and
//! only know a handful of primitive types. [`SchemaProjector`] derives a
//! [`PropertySchema`] from a table's columns and projects each row onto it:
//!
//! 1. names are normalised (lower-cased, then cut to `max_length` characters)
//! 2. column types are classified as `str`, `int` or `float`; anything else is
//!    dropped with a warning
//! 3. rows keep only the properties whose normalised name is in the schema,
//!    with missing values filled with zero and every value coerced to the
//!    field's type
//!
//! ```
//! use stationgeo_core_common::schema::{FieldType, infer_schema};
//! use stationgeo_core_common::table::{Column, ColumnType};
//!
//! let columns = vec![
//!     Column::new("Latitude", ColumnType::Float, [27.0]),
//!     Column::new("Responsible Party", ColumnType::String, ["USF"]),
//! ];
//! let schema = infer_schema(&columns, 10);
//! assert_eq!(schema.get("latitude"), Some(FieldType::Float));
//! assert_eq!(schema.get("responsibl"), Some(FieldType::Str));
//! ```

use std::fmt;

use log::{debug, warn};

use crate::error::SchemaError;
use crate::feature::Properties;
use crate::table::{CellValue, Column, ColumnType};

/// Field name length ceiling of the legacy container format.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 10;

/// Primitive field types supported by the constrained output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Text
    Str,
    /// Integer
    Int,
    /// Floating point
    Float,
}

impl FieldType {
    /// Maps a column type onto a field type, if one exists.
    #[must_use]
    pub fn classify(column_type: ColumnType) -> Option<Self> {
        match column_type {
            ColumnType::String => Some(FieldType::Str),
            ColumnType::Integer => Some(FieldType::Int),
            ColumnType::Float => Some(FieldType::Float),
            ColumnType::Boolean => None,
        }
    }

    /// Returns the string representation of this field type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Str => "str",
            FieldType::Int => "int",
            FieldType::Float => "float",
        }
    }

    /// Converts a value into this field's output representation.
    ///
    /// Never fails: text that does not parse as a number becomes zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn coerce(&self, value: &CellValue) -> CellValue {
        match (self, value) {
            (FieldType::Str, CellValue::Str(s)) => CellValue::Str(s.clone()),
            (FieldType::Str, other) => CellValue::Str(other.to_string()),
            (FieldType::Int, CellValue::Int(v)) => CellValue::Int(*v),
            (FieldType::Float, CellValue::Float(v)) => CellValue::Float(*v),
            (FieldType::Int, CellValue::Str(s)) => {
                let parsed = s
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .or_else(|| s.trim().parse::<f64>().ok().map(|f| f.trunc() as i64));
                CellValue::Int(parsed.unwrap_or_else(|| {
                    debug!("'{s}' is not an integer, writing 0");
                    0
                }))
            },
            (FieldType::Int, other) => CellValue::Int(other.as_f64().map_or(0, |f| f.trunc() as i64)),
            (FieldType::Float, other) => CellValue::Float(other.as_f64().unwrap_or_else(|| {
                debug!("'{other}' is not a number, writing 0");
                0.0
            })),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How raw column names become constrained field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameRule {
    /// Maximum number of characters kept
    pub max_length: usize,
    /// Lower-case before truncating
    pub lowercase: bool,
}

impl Default for NameRule {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NAME_LENGTH)
    }
}

impl NameRule {
    /// Lower-casing rule with the given length ceiling.
    #[must_use]
    pub const fn new(max_length: usize) -> Self {
        Self {
            max_length,
            lowercase: true,
        }
    }

    /// Rule that truncates but keeps the original case.
    #[must_use]
    pub const fn preserving_case(max_length: usize) -> Self {
        Self {
            max_length,
            lowercase: false,
        }
    }

    /// Normalises a raw column name.
    #[must_use]
    pub fn normalize(&self, name: &str) -> String {
        if self.lowercase {
            name.to_lowercase().chars().take(self.max_length).collect()
        } else {
            name.chars().take(self.max_length).collect()
        }
    }
}

/// One field of a [`PropertySchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    /// Normalised field name
    pub name: String,
    /// Field type
    pub field_type: FieldType,
}

/// Ordered mapping from normalised field name to field type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySchema {
    fields: Vec<SchemaField>,
}

impl PropertySchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field. An existing name keeps its position and takes the new type.
    pub fn insert(&mut self, name: impl Into<String>, field_type: FieldType) {
        let name = name.into();
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.field_type = field_type,
            None => self.fields.push(SchemaField { name, field_type }),
        }
    }

    /// Type of the named field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.field_type)
    }

    /// Returns `true` when the field exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Fields in schema order.
    #[must_use]
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when the schema has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Distinct columns that normalise to the same field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollision {
    /// The shared normalised name
    pub normalized: String,
    /// Raw column names in table order; the last one's type is in the schema
    pub columns: Vec<String>,
}

impl From<NameCollision> for SchemaError {
    fn from(c: NameCollision) -> Self {
        SchemaError::NameCollisionAfterTruncation {
            normalized: c.normalized,
            columns: c.columns,
        }
    }
}

/// A column left out of the schema because its type has no field counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedColumn {
    /// Raw column name
    pub column: String,
    /// Declared column type
    pub column_type: ColumnType,
}

impl From<&SkippedColumn> for SchemaError {
    fn from(s: &SkippedColumn) -> Self {
        SchemaError::UnclassifiableColumnType {
            column: s.column.clone(),
            column_type: s.column_type.to_string(),
        }
    }
}

/// Everything learned while folding columns into a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    /// Schema with last-write-wins applied
    pub schema: PropertySchema,
    /// Name collisions, in order of first occurrence
    pub collisions: Vec<NameCollision>,
    /// Columns dropped for unclassifiable types
    pub skipped: Vec<SkippedColumn>,
}

/// What to do when column names collide after normalisation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Keep the later column silently
    LastWriteWins,
    /// Keep the later column and log a warning
    #[default]
    Warn,
    /// Refuse to build the schema
    Error,
}

impl CollisionPolicy {
    /// Returns the string representation of this policy.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionPolicy::LastWriteWins => "last-write-wins",
            CollisionPolicy::Warn => "warn",
            CollisionPolicy::Error => "error",
        }
    }
}

/// Derives constrained schemas and projects rows onto them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaProjector {
    rule: NameRule,
    policy: CollisionPolicy,
}

impl SchemaProjector {
    /// Creates a projector with the given naming rule and the default collision policy.
    #[must_use]
    pub fn new(rule: NameRule) -> Self {
        Self {
            rule,
            policy: CollisionPolicy::default(),
        }
    }

    /// Set the collision policy
    #[must_use]
    pub fn with_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The naming rule in use.
    #[must_use]
    pub fn rule(&self) -> NameRule {
        self.rule
    }

    /// The collision policy in use.
    #[must_use]
    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Folds columns into a schema, recording collisions and skipped columns.
    ///
    /// Pure: nothing is logged and no policy is applied.
    #[must_use]
    pub fn inspect(&self, columns: &[Column]) -> SchemaReport {
        let mut report = SchemaReport::default();
        for column in columns {
            let Some(field_type) = FieldType::classify(column.declared_type) else {
                report.skipped.push(SkippedColumn {
                    column: column.name.clone(),
                    column_type: column.declared_type,
                });
                continue;
            };

            let name = self.rule.normalize(&column.name);
            if report.schema.contains(&name) {
                match report.collisions.iter_mut().find(|c| c.normalized == name) {
                    Some(collision) => collision.columns.push(column.name.clone()),
                    None => {
                        let earlier = columns
                            .iter()
                            .filter(|c| FieldType::classify(c.declared_type).is_some())
                            .find(|c| self.rule.normalize(&c.name) == name)
                            .map(|c| c.name.clone())
                            .unwrap_or_default();
                        report.collisions.push(NameCollision {
                            normalized: name.clone(),
                            columns: vec![earlier, column.name.clone()],
                        });
                    },
                }
            }
            report.schema.insert(name, field_type);
        }
        report
    }

    /// Derives the schema, logging skipped columns and applying the collision policy.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NameCollisionAfterTruncation`] for the first
    /// collision when the policy is [`CollisionPolicy::Error`].
    pub fn infer_schema(&self, columns: &[Column]) -> Result<PropertySchema, SchemaError> {
        let report = self.inspect(columns);
        warn_skipped(&report);

        match self.policy {
            CollisionPolicy::LastWriteWins => {},
            CollisionPolicy::Warn => warn_collisions(&report),
            CollisionPolicy::Error => {
                if let Some(collision) = report.collisions.into_iter().next() {
                    return Err(collision.into());
                }
            },
        }

        Ok(report.schema)
    }

    /// Projects one row onto `schema`.
    ///
    /// Names are normalised with this projector's rule; pairs whose name is
    /// not in the schema are dropped; missing values become zero; every kept
    /// value is coerced to its field type. Later pairs overwrite earlier ones
    /// that normalise to the same name.
    pub fn project_row<'a, I>(&self, row: I, schema: &PropertySchema) -> Properties
    where
        I: IntoIterator<Item = (&'a str, &'a CellValue)>,
    {
        let zero = CellValue::Int(0);
        let mut projected = Properties::new();
        for (name, value) in row {
            let key = self.rule.normalize(name);
            let Some(field_type) = schema.get(&key) else {
                continue;
            };
            let value = if value.is_missing() {
                &zero
            } else {
                value
            };
            projected.insert(key, field_type.coerce(value));
        }
        projected
    }
}

/// Derives a constrained schema with the default lower-casing rule.
///
/// Unclassifiable columns are dropped with a warning; colliding names resolve
/// last-write-wins with a warning.
#[must_use]
pub fn infer_schema(columns: &[Column], max_name_length: usize) -> PropertySchema {
    let report = SchemaProjector::new(NameRule::new(max_name_length)).inspect(columns);
    warn_skipped(&report);
    warn_collisions(&report);
    report.schema
}

fn warn_skipped(report: &SchemaReport) {
    for skipped in &report.skipped {
        warn!("{}", SchemaError::from(skipped));
    }
}

fn warn_collisions(report: &SchemaReport) {
    for collision in &report.collisions {
        warn!(
            "{}; keeping '{}'",
            SchemaError::from(collision.clone()),
            collision.columns.last().map_or("", String::as_str)
        );
    }
}

/// Projects a row onto `schema` with the default lower-casing rule.
pub fn project_row<'a, I>(row: I, schema: &PropertySchema, max_name_length: usize) -> Properties
where
    I: IntoIterator<Item = (&'a str, &'a CellValue)>,
{
    SchemaProjector::new(NameRule::new(max_name_length)).project_row(row, schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    fn station_columns() -> Vec<Column> {
        vec![
            Column::new("Latitude", ColumnType::Float, [27.0]),
            Column::new("Status", ColumnType::String, ["Operational"]),
            Column::new("MHz", ColumnType::Float, [5.0]),
        ]
    }

    #[test]
    fn test_infer_schema_short_names() {
        let schema = infer_schema(&station_columns(), 10);
        let fields: Vec<(&str, FieldType)> = schema
            .fields()
            .iter()
            .map(|f| (f.name.as_str(), f.field_type))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("latitude", FieldType::Float),
                ("status", FieldType::Str),
                ("mhz", FieldType::Float),
            ]
        );
    }

    #[test]
    fn test_normalize_truncates_to_ten() {
        let rule = NameRule::new(10);
        assert_eq!(rule.normalize("Responsible Party"), "responsibl");
        assert_eq!(rule.normalize("Responsible Party").chars().count(), 10);
        assert_eq!(rule.normalize("MHz"), "mhz");
    }

    #[test]
    fn test_preserving_case_rule() {
        let rule = NameRule::preserving_case(9);
        assert_eq!(rule.normalize("contributor_name"), "contribut");
        assert_eq!(rule.normalize("Title"), "Title");
    }

    #[test]
    fn test_normalize_counts_characters_not_bytes() {
        let rule = NameRule::new(3);
        assert_eq!(rule.normalize("Élévation"), "élé");
    }

    #[test]
    fn test_boolean_columns_are_skipped() {
        let columns = vec![
            Column::new("Active", ColumnType::Boolean, [true]),
            Column::new("Name", ColumnType::String, ["a"]),
        ];
        let projector = SchemaProjector::default();
        let report = projector.inspect(&columns);
        assert_eq!(report.schema.len(), 1);
        assert_eq!(
            report.skipped,
            vec![SkippedColumn {
                column: "Active".to_string(),
                column_type: ColumnType::Boolean,
            }]
        );
        assert!(projector.infer_schema(&columns).is_ok());
    }

    #[test]
    fn test_collisions_are_reported_last_write_wins() {
        let columns = vec![
            Column::new("Responsible Party", ColumnType::String, ["USF"]),
            Column::new("Responsible Lead", ColumnType::Integer, [3_i64]),
            Column::new("Responsible Agency", ColumnType::Float, [1.5]),
        ];
        let report = SchemaProjector::default().inspect(&columns);
        assert_eq!(report.schema.len(), 1);
        assert_eq!(report.schema.get("responsibl"), Some(FieldType::Float));
        assert_eq!(
            report.collisions,
            vec![NameCollision {
                normalized: "responsibl".to_string(),
                columns: vec![
                    "Responsible Party".to_string(),
                    "Responsible Lead".to_string(),
                    "Responsible Agency".to_string(),
                ],
            }]
        );
    }

    #[test]
    fn test_free_infer_schema_keeps_last_collision() {
        let columns = vec![
            Column::new("Responsible Party", ColumnType::String, ["USF"]),
            Column::new("Responsible Agency", ColumnType::Float, [1.5]),
            Column::new("has_data", ColumnType::Boolean, [true]),
        ];
        let schema = infer_schema(&columns, 10);
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.get("responsibl"), Some(FieldType::Float));
    }

    #[test]
    fn test_collision_policy_error() {
        let columns = vec![
            Column::new("Responsible Party", ColumnType::String, ["USF"]),
            Column::new("Responsible Lead", ColumnType::String, ["x"]),
        ];
        let projector = SchemaProjector::default().with_policy(CollisionPolicy::Error);
        let err = projector.infer_schema(&columns).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::NameCollisionAfterTruncation { ref normalized, .. } if normalized == "responsibl"
        ));

        let lenient = SchemaProjector::default().with_policy(CollisionPolicy::LastWriteWins);
        assert_eq!(lenient.infer_schema(&columns).unwrap().len(), 1);
    }

    #[test]
    fn test_project_row_filters_and_coerces() {
        let table = Table::try_new(vec![
            Column::new("Latitude", ColumnType::Float, [27.0]),
            Column::new("Status", ColumnType::String, ["Operational"]),
            Column::new("MHz", ColumnType::Float, [Option::<f64>::None]),
            Column::new("Active", ColumnType::Boolean, [true]),
        ])
        .unwrap();
        let schema = infer_schema(table.columns(), 10);
        let row = table.rows().next().unwrap();

        let projected = project_row(row.iter(), &schema, 10);
        assert_eq!(projected.len(), 3);
        assert_eq!(projected.get("latitude"), Some(&CellValue::Float(27.0)));
        assert_eq!(projected.get("status"), Some(&CellValue::from("Operational")));
        // missing numeric filled with zero then coerced to float
        assert_eq!(projected.get("mhz"), Some(&CellValue::Float(0.0)));
        assert!(!projected.contains_key("active"));
    }

    #[test]
    fn test_project_row_missing_text_becomes_zero_string() {
        let mut schema = PropertySchema::new();
        schema.insert("status", FieldType::Str);
        let value = CellValue::Null;
        let projected = project_row([("Status", &value)], &schema, 10);
        assert_eq!(projected.get("status"), Some(&CellValue::from("0")));
    }

    #[test]
    fn test_coerce() {
        assert_eq!(FieldType::Str.coerce(&CellValue::Float(5.0)), CellValue::from("5.0"));
        assert_eq!(FieldType::Int.coerce(&CellValue::Float(12.6)), CellValue::Int(12));
        assert_eq!(FieldType::Int.coerce(&CellValue::from("42")), CellValue::Int(42));
        assert_eq!(FieldType::Int.coerce(&CellValue::from("n/a")), CellValue::Int(0));
        assert_eq!(FieldType::Float.coerce(&CellValue::Int(3)), CellValue::Float(3.0));
        assert_eq!(FieldType::Float.coerce(&CellValue::from("x")), CellValue::Float(0.0));
    }
}
