//! In-memory constrained layer.

use geo_types::Geometry;
use log::debug;
use stationgeo_core_common::error::{FormatError, FormatResult};
use stationgeo_core_common::feature::{Feature, GeometryKind, Properties, fill_missing_with_zero};
use stationgeo_core_common::schema::{PropertySchema, SchemaProjector};

/// One layer record: a geometry and its projected properties.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRecord {
    /// Record geometry, of the layer's kind
    pub geometry: Geometry<f64>,
    /// Properties keyed by schema field name
    pub properties: Properties,
}

/// Geometry kind, schema and records of a constrained output.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstrainedLayer {
    geometry_kind: GeometryKind,
    schema: PropertySchema,
    records: Vec<LayerRecord>,
}

impl ConstrainedLayer {
    /// Creates an empty layer.
    #[must_use]
    pub fn new(geometry_kind: GeometryKind, schema: PropertySchema) -> Self {
        Self {
            geometry_kind,
            schema,
            records: Vec::new(),
        }
    }

    /// Builds a layer by projecting every feature onto `schema`.
    ///
    /// Missing values are filled with zero before projection.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Encode`] when a feature's geometry is not of
    /// `geometry_kind`.
    pub fn build(
        geometry_kind: GeometryKind,
        schema: PropertySchema,
        features: &[Feature],
        projector: &SchemaProjector,
    ) -> FormatResult<Self> {
        let mut layer = Self::new(geometry_kind, schema);
        for feature in features {
            let filled = fill_missing_with_zero(&feature.properties);
            let projected = projector.project_row(filled.iter(), &layer.schema);
            layer.push(feature.geometry.clone(), projected)?;
        }
        debug!(
            "Built {} layer with {} fields and {} records",
            layer.geometry_kind,
            layer.schema.len(),
            layer.records.len()
        );
        Ok(layer)
    }

    /// Appends an already projected record.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Encode`] when the geometry kind does not match.
    pub fn push(&mut self, geometry: Geometry<f64>, properties: Properties) -> FormatResult<()> {
        match GeometryKind::of(&geometry) {
            Some(kind) if kind == self.geometry_kind => {},
            found => {
                return Err(FormatError::Encode {
                    message: format!(
                        "Layer holds {} geometries, got {}",
                        self.geometry_kind,
                        found.map_or("an unsupported geometry", |k| k.as_str())
                    ),
                    context: Some(format!("record {}", self.records.len() + 1)),
                });
            },
        }
        self.records.push(LayerRecord {
            geometry,
            properties,
        });
        Ok(())
    }

    /// Geometry kind of every record.
    #[must_use]
    pub fn geometry_kind(&self) -> GeometryKind {
        self.geometry_kind
    }

    /// Field schema.
    #[must_use]
    pub fn schema(&self) -> &PropertySchema {
        &self.schema
    }

    /// Records in feature order.
    #[must_use]
    pub fn records(&self) -> &[LayerRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the layer has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{LineString, Point};
    use stationgeo_core_common::schema::{FieldType, NameRule};
    use stationgeo_core_common::table::CellValue;

    fn schema() -> PropertySchema {
        let mut schema = PropertySchema::new();
        schema.insert("status", FieldType::Str);
        schema.insert("mhz", FieldType::Float);
        schema.insert("startangle", FieldType::Int);
        schema
    }

    fn station(status: CellValue, mhz: CellValue) -> Feature {
        let properties: Properties = vec![
            ("Status".to_string(), status),
            ("MHz".to_string(), mhz),
            ("StartAngle".to_string(), CellValue::Null),
            ("Ignored Column".to_string(), CellValue::from("x")),
        ]
        .into_iter()
        .collect();
        Feature::new(Point::new(-80.0, 27.0), properties)
    }

    #[test]
    fn test_build_projects_and_fills() {
        let features = vec![station(CellValue::from("Operational"), CellValue::Float(5.0))];
        let projector = SchemaProjector::new(NameRule::new(10));
        let layer = ConstrainedLayer::build(GeometryKind::Point, schema(), &features, &projector)
            .unwrap();
        assert_eq!(layer.len(), 1);
        let props = &layer.records()[0].properties;
        assert_eq!(props.get("status"), Some(&CellValue::from("Operational")));
        assert_eq!(props.get("mhz"), Some(&CellValue::Float(5.0)));
        assert_eq!(props.get("startangle"), Some(&CellValue::Int(0)));
        assert!(!props.contains_key("ignored co"));
        // the source feature keeps its null
        assert_eq!(features[0].properties.get("StartAngle"), Some(&CellValue::Null));
    }

    #[test]
    fn test_missing_string_becomes_zero_text() {
        let features = vec![station(CellValue::Null, CellValue::Null)];
        let layer = ConstrainedLayer::build(
            GeometryKind::Point,
            schema(),
            &features,
            &SchemaProjector::default(),
        )
        .unwrap();
        let props = &layer.records()[0].properties;
        assert_eq!(props.get("status"), Some(&CellValue::from("0")));
        assert_eq!(props.get("mhz"), Some(&CellValue::Float(0.0)));
    }

    #[test]
    fn test_rejects_other_geometry_kinds() {
        let mut layer = ConstrainedLayer::new(GeometryKind::Polygon, schema());
        let err = layer
            .push(
                Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)])),
                Properties::new(),
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Encode error in record 1: Layer holds Polygon geometries, got LineString"
        );
        assert!(layer.is_empty());
    }
}
