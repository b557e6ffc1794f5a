//! Error types shared by the data model, the schema projector and the format crates.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Invalid inputs to geometry construction.
///
/// Fatal to the single feature being built. The caller decides whether the
/// row is skipped or the whole run aborts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A parameter is out of range or not finite
    #[error("Invalid {parameter}: {message}")]
    InvalidParameter {
        /// Name of the offending parameter (e.g. "distance", "latitude")
        parameter: String,
        /// Why the value was rejected
        message: String,
    },
}

impl GeometryError {
    /// Shorthand for [`GeometryError::InvalidParameter`].
    #[must_use]
    pub fn invalid(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

/// Problems found while deriving a constrained property schema.
///
/// Neither variant aborts a conversion on its own: unclassifiable columns are
/// dropped, collisions are resolved according to the caller's policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Column type has no `str`/`int`/`float` counterpart
    #[error("Could not find a constrained field type for column '{column}' ({column_type})")]
    UnclassifiableColumnType {
        /// The raw column name
        column: String,
        /// The declared column type
        column_type: String,
    },

    /// Distinct column names normalise to the same field name
    #[error("Columns {} all normalise to field '{normalized}'", columns.join(", "))]
    NameCollisionAfterTruncation {
        /// The shared normalised name
        normalized: String,
        /// Raw column names in table order; the last one wins
        columns: Vec<String>,
    },
}

/// Structural table errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// A column's length does not match the table's row count
    #[error("Column '{column}' has {found} values, expected {expected}")]
    LengthMismatch {
        /// The column name
        column: String,
        /// Rows in the table
        expected: usize,
        /// Values in the column
        found: usize,
    },

    /// Two columns share a name
    #[error("Duplicate column '{column}'")]
    DuplicateColumn {
        /// The duplicated name
        column: String,
    },

    /// A required column is absent
    #[error("Missing column '{column}'")]
    MissingColumn {
        /// The column that was looked up
        column: String,
    },
}

/// A position within a source file, such as a CSV record.
///
/// All indices are 1-based where possible to align with human expectations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePosition {
    /// Line number in the source (1-based)
    pub line: Option<u64>,
    /// Column (field) number in the source (1-based)
    pub column: Option<u64>,
    /// Logical record number reported by the parser
    pub record: Option<u64>,
}

impl SourcePosition {
    /// Returns true when the position does not contain any location metadata.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line.is_none() && self.column.is_none() && self.record.is_none()
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(line) = self.line {
            parts.push(format!("line {line}"));
        }
        if let Some(column) = self.column {
            parts.push(format!("column {column}"));
        }
        if let Some(record) = self.record {
            parts.push(format!("record {record}"));
        }

        if parts.is_empty() {
            write!(f, "unknown position")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Errors raised while reading or writing one of the artifact formats.
#[derive(Debug)]
pub enum FormatError {
    /// An underlying I/O failure occurred.
    Io {
        /// The originating error.
        source: std::io::Error,
        /// Optional context describing what was being read or written.
        context: Option<String>,
    },
    /// Parsing failed for the input source.
    Parse {
        /// Human readable description of the failure.
        message: String,
        /// Optional position describing where the failure occurred.
        position: Option<SourcePosition>,
        /// Optional context describing what was being read.
        context: Option<String>,
    },
    /// A value or geometry could not be encoded in the output format.
    Encode {
        /// Human readable description of the failure.
        message: String,
        /// Optional context describing what was being written.
        context: Option<String>,
    },
    /// Other error type not classified above.
    Other {
        /// Human readable description of the failure.
        message: String,
    },
}

impl FormatError {
    fn fmt_context(context: Option<&str>) -> String {
        context.map(|c| format!(" in {c}")).unwrap_or_default()
    }

    fn fmt_position(position: Option<&SourcePosition>) -> String {
        position.map(|pos| format!(" at {pos}")).unwrap_or_default()
    }

    /// Attach additional context to the error, returning the updated error.
    #[must_use]
    pub fn with_additional_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        match &mut self {
            FormatError::Io {
                context: existing, ..
            }
            | FormatError::Parse {
                context: existing, ..
            }
            | FormatError::Encode {
                context: existing, ..
            } => match existing {
                Some(existing) if !existing.is_empty() => {
                    existing.push_str("; ");
                    existing.push_str(&context);
                },
                _ => *existing = Some(context),
            },
            FormatError::Other { message } => {
                message.push_str(" (");
                message.push_str(&context);
                message.push(')');
            },
        }
        self
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Io { source, context } => {
                write!(
                    f,
                    "I/O error{}: {source}",
                    Self::fmt_context(context.as_deref())
                )
            },
            FormatError::Parse {
                message,
                position,
                context,
            } => write!(
                f,
                "Parse error{}{}: {message}",
                Self::fmt_context(context.as_deref()),
                Self::fmt_position(position.as_ref())
            ),
            FormatError::Encode { message, context } => write!(
                f,
                "Encode error{}: {message}",
                Self::fmt_context(context.as_deref())
            ),
            FormatError::Other { message } => f.write_str(message),
        }
    }
}

impl StdError for FormatError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            FormatError::Io { source, .. } => Some(source),
            FormatError::Parse { .. } | FormatError::Encode { .. } | FormatError::Other { .. } => {
                None
            },
        }
    }
}

impl From<std::io::Error> for FormatError {
    fn from(source: std::io::Error) -> Self {
        FormatError::Io {
            source,
            context: None,
        }
    }
}

/// Result type alias that uses [`FormatError`].
pub type FormatResult<T> = Result<T, FormatError>;
