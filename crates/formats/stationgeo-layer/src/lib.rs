//! Attribute-constrained vector layers.
//!
//! A [`ConstrainedLayer`] holds one geometry kind, a [`PropertySchema`] whose
//! field names respect the container's length ceiling, and one record per
//! feature with projected properties. Layers are persisted as a CSV file with
//! a WKT `geometry` column plus a JSON schema sidecar.
//!
//! [`PropertySchema`]: stationgeo_core_common::schema::PropertySchema

pub mod layer;
pub mod writer;

pub use layer::{ConstrainedLayer, LayerRecord};
pub use writer::{LayerFiles, LayerWriterOptions, schema_document, write_layer, write_layer_csv};
