//! Display utilities for formatting CLI output.
//!
//! This module provides table row structures and formatting functions
//! for presenting datasets, schemas and conversion results.

use tabled::{Table, Tabled};

use stationgeo_core::ConversionSummary;
use stationgeo_core::datasets::Dataset;
use stationgeo_core_common::schema::SchemaReport;

/// Table row representation for displaying dataset registry entries.
#[derive(Tabled)]
pub struct DatasetRow {
    /// Short identifier passed to `--dataset`.
    #[tabled(rename = "Short Name")]
    pub short_name: String,
    /// Descriptive name of the dataset.
    #[tabled(rename = "Long Name")]
    pub long_name: String,
    /// Input format.
    #[tabled(rename = "Input")]
    pub input: String,
    /// Geometry kind of the constrained layer.
    #[tabled(rename = "Layer Geometry")]
    pub geometry: String,
    /// Maximum field name length in the constrained layer.
    #[tabled(rename = "Name Length")]
    pub name_length: usize,
}

impl From<&Dataset> for DatasetRow {
    fn from(dataset: &Dataset) -> Self {
        Self {
            short_name: dataset.short_name.to_string(),
            long_name: dataset.long_name.to_string(),
            input: dataset.input.to_string(),
            geometry: dataset.geometry.to_string(),
            name_length: dataset.name_rule.max_length,
        }
    }
}

/// Table row representation for displaying constrained schema fields.
#[derive(Tabled)]
pub struct FieldRow {
    /// Constrained field name.
    #[tabled(rename = "Field")]
    pub name: String,
    /// Field type (`str`, `int` or `float`).
    #[tabled(rename = "Type")]
    pub field_type: String,
}

/// Table row representation for a name collision.
#[derive(Tabled)]
pub struct CollisionRow {
    /// The shared constrained name.
    #[tabled(rename = "Field")]
    pub name: String,
    /// Source columns in input order; the last one wins.
    #[tabled(rename = "Columns")]
    pub columns: String,
}

/// Table row representation for a column left out of the schema.
#[derive(Tabled)]
pub struct SkippedColumnRow {
    #[tabled(rename = "Column")]
    pub column: String,
    #[tabled(rename = "Type")]
    pub column_type: String,
}

/// Two-column row for the conversion summary.
#[derive(Tabled)]
pub struct SummaryRow {
    #[tabled(rename = "Item")]
    pub item: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Display the dataset registry.
pub fn display_datasets(datasets: &[Dataset]) {
    println!("\nAvailable Datasets ({} total):\n", datasets.len());
    let rows: Vec<DatasetRow> = datasets.iter().map(DatasetRow::from).collect();
    println!("{}", Table::new(rows));
}

/// Display a schema report: fields, then collisions and skipped columns if any.
pub fn display_schema_report(dataset: &str, report: &SchemaReport) {
    println!("\nDataset: {dataset}");

    println!("\n=== Fields ===");
    let field_rows: Vec<FieldRow> = report
        .schema
        .fields()
        .iter()
        .map(|f| FieldRow {
            name: f.name.clone(),
            field_type: f.field_type.to_string(),
        })
        .collect();
    println!("{}", Table::new(field_rows));

    if !report.collisions.is_empty() {
        println!("\n=== Name Collisions ===");
        let rows: Vec<CollisionRow> = report
            .collisions
            .iter()
            .map(|c| CollisionRow {
                name: c.normalized.clone(),
                columns: c.columns.join(", "),
            })
            .collect();
        println!("{}", Table::new(rows));
    }

    if !report.skipped.is_empty() {
        println!("\n=== Skipped Columns ===");
        let rows: Vec<SkippedColumnRow> = report
            .skipped
            .iter()
            .map(|s| SkippedColumnRow {
                column: s.column.clone(),
                column_type: s.column_type.to_string(),
            })
            .collect();
        println!("{}", Table::new(rows));
    }
}

/// Rows describing a finished conversion.
#[must_use]
pub fn summary_rows(summary: &ConversionSummary) -> Vec<SummaryRow> {
    let row = |item: &str, value: String| SummaryRow {
        item: item.to_string(),
        value,
    };
    let mut rows = vec![
        row("Dataset", summary.dataset.clone()),
        row("Input", summary.input.display().to_string()),
        row("Rows read", summary.rows_read.to_string()),
        row("Features written", summary.features_written.to_string()),
        row("Layer records", summary.layer_records.to_string()),
        row("Skipped rows", summary.skipped_rows.to_string()),
        row("Schema fields", summary.schema_fields.to_string()),
        row("Name collisions", summary.collisions.to_string()),
        row("GeoJSON", summary.geojson.display().to_string()),
    ];
    if let Some(layer) = &summary.layer {
        rows.push(row("Layer", layer.data.display().to_string()));
        if let Some(schema) = &layer.schema {
            rows.push(row("Layer schema", schema.display().to_string()));
        }
    }
    rows
}

/// Display a conversion summary.
pub fn display_summary(summary: &ConversionSummary) {
    println!("\nConversion complete:\n");
    println!("{}", Table::new(summary_rows(summary)));
}
