//! `stationgeo-core` turns station and sensor metadata tables into map layers.
//!
//! This crate includes:
//! - **Dataset Registry**: the station metadata datasets and how each one is read.
//! - **Catalog**: status colours, platform icons, radar ranges and filters.
//! - **Sectors**: great-circle coverage wedges for HF radar sites.
//! - **Operations**: pipelines producing an unconstrained `GeoJSON` document
//!   and an attribute-constrained layer for each dataset.

pub mod catalog;
pub mod datasets;
pub mod error;
pub mod operations;
pub mod sector;
pub mod types;

pub use catalog::Catalog;
pub use datasets::{Dataset, DatasetKind, InputFormat, find_dataset, get_dataset_names, get_datasets};
pub use error::{Result, StationGeoError};
pub use operations::{
    ConvertOptions, RowErrorPolicy, build_dataset, build_track_dataset, convert, decorate_table,
    inspect_dataset,
};
pub use sector::{Sector, wedge};
pub use types::{ConversionSummary, DatasetOutput, SkippedRow};
