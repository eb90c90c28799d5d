//! Error types for batch encoding, record parsing and manifest validation

use thiserror::Error;
use vbac_schema::{FieldKindTag, SchemaError};

/// Errors that abort offline encoding or reject a record outright
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Batch contains no rows")]
    EmptyBatch,
    #[error("Batch is missing column for registry field: {0}")]
    MissingColumn(String),
    #[error("Batch row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("Outcome has {classes} distinct class(es) after filtering {rows} row(s); need 2")]
    DegenerateOutcome { classes: usize, rows: usize },
    #[error("No usable feature columns remain after filtering")]
    NoUsableColumns,
    #[error("Invalid encoder option: {0}")]
    InvalidOption(String),
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Disagreement between a feature manifest and the registry or itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("Manifest built for schema {manifest}, registry is {registry}")]
    VersionMismatch { manifest: String, registry: String },
    #[error("Manifest binds field {0} that the registry does not define")]
    UnknownField(String),
    #[error("Registry field {0} has no binding in the manifest")]
    UnboundField(String),
    #[error("Field {field} is bound as {bound} but the registry declares {declared}")]
    KindMismatch {
        field: String,
        bound: FieldKindTag,
        declared: FieldKindTag,
    },
    #[error("Field {field} references category {label} unknown to the registry")]
    UnknownCategory { field: String, label: String },
    #[error("Field {field}: reference {manifest} differs from registry reference {registry}")]
    ReferenceMismatch {
        field: String,
        manifest: String,
        registry: String,
    },
    #[error("Column index {index} out of range for {len} manifest columns")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Column {column} is bound {count} times")]
    ColumnBindingCount { column: String, count: usize },
    #[error("Column {index} is named {actual}, binding expects {expected}")]
    ColumnNameMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("Field {0}: sentinel codes differ from the registry")]
    SentinelMismatch(String),
    #[error("Duplicate manifest column: {0}")]
    DuplicateColumn(String),
}
