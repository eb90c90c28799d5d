//! Errors raised while assembling a schema registry

use thiserror::Error;

/// Errors that can occur while building a [`crate::SchemaRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Duplicate field name: {0}")]
    DuplicateField(String),
    #[error("Field {field} maps code {code} more than once")]
    DuplicateCode { field: String, code: String },
    #[error("Field {0} has no categories")]
    EmptyVocabulary(String),
    #[error("Field {field}: reference category {reference} is not one of its labels")]
    UnknownReference { field: String, reference: String },
    #[error("Field {field}: code {code} is both a sentinel and a mapped code")]
    SentinelCollision { field: String, code: String },
    #[error("Field {field}: true label and false label are both {label}")]
    AmbiguousFlagLabels { field: String, label: String },
    #[error("Outcome column {0} collides with a predictor field")]
    OutcomeCollision(String),
    #[error("Outcome {0} needs at least one negative code distinct from the positive code")]
    InvalidOutcome(String),
    #[error("Fields {first} and {second} both derive column name {column}")]
    ColumnNameCollision {
        first: String,
        second: String,
        column: String,
    },
}
