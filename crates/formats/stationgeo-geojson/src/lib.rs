//! `GeoJSON` input and output for `stationgeo`.
//!
//! The writer produces the unconstrained artifact: a `FeatureCollection` with
//! keys sorted at every level and two-space indentation, so repeated runs over
//! the same table produce byte-identical files. The parser reads track
//! features from a collection, a single feature, a bare geometry or a
//! newline-delimited sequence.

pub mod parser;
pub mod writer;

pub use parser::{FeatureRecord, json_to_cell, parse_geojson_bytes, read_features_file};
pub use writer::{
    GeoJsonWriterOptions, cell_to_json, write_feature_collection,
    write_feature_collection_to_bytes,
};
