//! Custom error types for `stationgeo` operations.
//!
//! Domain failures from the data model, the format crates and the pipelines
//! all funnel into [`StationGeoError`], which keeps the originating variant so
//! callers can tell a bad geometry from a bad configuration file.

use std::path::PathBuf;
use thiserror::Error;

pub use stationgeo_core_common::error::{FormatError, GeometryError, SchemaError, TableError};

/// Main error type for `stationgeo` operations.
///
/// Delegates display formatting to the underlying variant.
#[derive(Debug, Error)]
pub enum StationGeoError {
    /// Invalid geometry inputs (negative range, out-of-range coordinates)
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Schema derivation refused under the current collision policy
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Missing or malformed input columns
    #[error(transparent)]
    Table(#[from] TableError),

    /// Reading or writing one of the artifact formats failed
    #[error(transparent)]
    Format(#[from] FormatError),

    /// I/O errors with path context
    #[error(transparent)]
    Io(#[from] IoError),

    /// Dataset registry errors
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic errors from dependencies
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Dataset registry errors.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Dataset was not found in the registry
    #[error("Dataset '{name}' not found. Available datasets: {available}")]
    NotFound {
        /// The requested dataset name
        name: String,
        /// Comma-separated list of available datasets
        available: String,
    },

    /// The dataset expects another input format
    #[error("Dataset '{dataset}' reads {expected} input, got '{path}'")]
    InputMismatch {
        /// The dataset name
        dataset: String,
        /// Expected input format
        expected: String,
        /// The offending input path
        path: PathBuf,
    },
}

/// I/O related errors.
#[derive(Debug, Error)]
pub enum IoError {
    /// Failed to read from a file
    #[error("Failed to read {format} file '{path}': {source}")]
    Read {
        /// The format being read (e.g., "CSV", "`GeoJSON`")
        format: String,
        /// The file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to write to a file
    #[error("Failed to write {format} file '{path}': {source}")]
    Write {
        /// The format being written
        format: String,
        /// The file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// File was not found
    #[error("File not found: '{path}'")]
    FileNotFound {
        /// The missing file path
        path: PathBuf,
    },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },

    /// A lookup table has no entry for a value found in the input
    #[error("No '{key}' entry in the {table} table")]
    MissingLookup {
        /// The catalog table consulted
        table: String,
        /// The value that was looked up
        key: String,
    },

    /// A catalog file could not be loaded
    #[error("Failed to load catalog '{path}': {message}")]
    Load {
        /// The catalog path
        path: PathBuf,
        /// What went wrong
        message: String,
    },
}

/// Type alias for Results using `StationGeoError`.
pub type Result<T> = std::result::Result<T, StationGeoError>;

impl StationGeoError {
    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Geometry(e) => format!("Geometry error: {e}"),
            Self::Schema(e) => format!("Schema error: {e}"),
            Self::Table(e) => format!("Input table error: {e}"),
            Self::Format(e) => e.to_string(),
            Self::Io(e) => e.user_message(),
            Self::Dataset(e) => e.user_message(),
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Other(e) => format!("Error: {e}"),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Geometry(_) => Some(
                "Fix the offending row or rerun with '--on-invalid-row skip' to drop it."
                    .to_string(),
            ),
            Self::Schema(SchemaError::NameCollisionAfterTruncation { .. }) => Some(
                "Rename the columns or rerun with '--collision-policy warn' to keep the last one."
                    .to_string(),
            ),
            Self::Table(TableError::MissingColumn { .. }) => {
                Some("Check that the input matches the selected dataset.".to_string())
            },
            Self::Format(FormatError::Parse { .. }) => {
                Some("Check the file format and ensure it's valid.".to_string())
            },
            Self::Io(e) => e.recovery_suggestion(),
            Self::Dataset(e) => e.recovery_suggestion(),
            Self::Config(ConfigError::MissingLookup { .. }) => Some(
                "Add the missing entry to a catalog file and pass it with '--catalog'.".to_string(),
            ),
            _ => None,
        }
    }

    /// Check if this error is potentially recoverable.
    ///
    /// Recoverable errors might be fixed by retrying with different
    /// parameters or after the user takes some action.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Geometry(_)
                | Self::Schema(_)
                | Self::Dataset(DatasetError::InputMismatch { .. })
        )
    }
}

impl DatasetError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { name, available } => {
                format!(
                    "Dataset '{name}' not found.\n\nAvailable datasets:\n{}",
                    available
                        .split(", ")
                        .map(|d| format!("  - {d}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                )
            },
            Self::InputMismatch { .. } => self.to_string(),
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound { .. } => {
                Some("Run 'stationgeo datasets' to see all available datasets.".to_string())
            },
            Self::InputMismatch { .. } => None,
        }
    }
}

impl IoError {
    fn user_message(&self) -> String {
        match self {
            Self::Read { format, path, .. } => {
                format!("Failed to read {} file: {}", format, path.display())
            },
            Self::Write { format, path, .. } => {
                format!("Failed to write {} file: {}", format, path.display())
            },
            Self::FileNotFound { path } => {
                format!("File not found: {}", path.display())
            },
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::FileNotFound { .. } => {
                Some("Check that the file path is correct and the file exists.".to_string())
            },
            Self::Write { .. } => {
                Some("Check that the output directory exists and is writable.".to_string())
            },
            Self::Read { .. } => None,
        }
    }
}

/// Extension trait for adding I/O context to errors.
pub trait IoErrorExt<T> {
    /// Add read context to an error.
    ///
    /// # Errors
    ///
    /// Returns an [`IoError::Read`] if the underlying operation fails.
    fn with_read_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T>;

    /// Add write context to an error.
    ///
    /// # Errors
    ///
    /// Returns an [`IoError::Write`] if the underlying operation fails.
    fn with_write_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T, E> IoErrorExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_read_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| {
            StationGeoError::Io(IoError::Read {
                format: format.to_string(),
                path: path.into(),
                source: Box::new(e),
            })
        })
    }

    fn with_write_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| {
            StationGeoError::Io(IoError::Write {
                format: format.to_string(),
                path: path.into(),
                source: Box::new(e),
            })
        })
    }
}

/// Helper to create `DatasetError::NotFound` with the available datasets.
#[must_use]
pub fn dataset_not_found(name: &str) -> DatasetError {
    use crate::datasets::get_dataset_names;

    DatasetError::NotFound {
        name: name.to_string(),
        available: get_dataset_names().join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_not_found_lists_registry() {
        let err: StationGeoError = dataset_not_found("buoys").into();
        let message = err.user_message();
        assert!(message.contains("Dataset 'buoys' not found"));
        assert!(message.contains("  - hfradar"));
        assert!(message.contains("  - glider-tracks"));
        assert_eq!(
            err.recovery_suggestion().as_deref(),
            Some("Run 'stationgeo datasets' to see all available datasets.")
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_geometry_error_is_recoverable() {
        let err: StationGeoError = GeometryError::invalid("distance", "-1 is negative").into();
        assert_eq!(err.to_string(), "Invalid distance: -1 is negative");
        assert!(err.is_recoverable());
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_missing_lookup_message() {
        let err: StationGeoError = ConfigError::MissingLookup {
            table: "status_colors".into(),
            key: "Retired".into(),
        }
        .into();
        assert_eq!(
            err.user_message(),
            "Configuration error: No 'Retired' entry in the status_colors table"
        );
    }

    #[test]
    fn test_io_error_ext() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = result.with_write_context("GeoJSON", "/tmp/out.geojson").unwrap_err();
        assert!(matches!(err, StationGeoError::Io(IoError::Write { .. })));
        assert_eq!(
            err.user_message(),
            "Failed to write GeoJSON file: /tmp/out.geojson"
        );
    }
}
