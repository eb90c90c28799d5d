//! Single-record encoder used at serving time.
//!
//! Reads only the [`FeatureManifest`] shipped with the model. Field values that cannot be
//! used degrade to the field's absent value and are reported as [`Diagnostic`]s; the only
//! hard failure is a record that is not a mapping at all.

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::EncodeError;
use crate::manifest::{FeatureManifest, FieldBinding};
use crate::offline::UNMAPPED_LABEL;
use crate::raw::{RawRecord, RawValue};

/// Named defaults for fields missing from a request.
///
/// These are policy decisions with clinical consequence and are kept in one place.
pub mod absent {
    /// Absent numeric field: zero, not the training median
    pub const NUMERIC: f64 = 0.0;
    /// Absent yes/no field: negative
    pub const FLAG: f64 = 0.0;
    /// Absent categorical field: every indicator zero, i.e. the reference category
    pub const INDICATOR: f64 = 0.0;
}

/// Fixed-length vector laid out by the manifest that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(v: Vec<f64>) -> Self {
        Self(v)
    }
}

/// A field value the encoder could not use
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    NumericCoercion { field: String, value: String },
    SentinelCode { field: String, value: String },
    UnrecognizedFlag { field: String, value: String },
    UnknownCategory { field: String, value: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::NumericCoercion { field, value } => {
                write!(f, "could not convert {field} value {value} to a number")
            }
            Diagnostic::SentinelCode { field, value } => {
                write!(f, "{field} value {value} is a not-stated code, treated as absent")
            }
            Diagnostic::UnrecognizedFlag { field, value } => {
                write!(f, "{field} value {value} is not a recognised yes/no label")
            }
            Diagnostic::UnknownCategory { field, value } => {
                write!(f, "{field} value {value} is not in the training vocabulary")
            }
        }
    }
}

/// Result of encoding one record
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub vector: FeatureVector,
    pub diagnostics: Vec<Diagnostic>,
    /// Bound fields with no value in the record
    pub absent: Vec<String>,
}

/// Stateless encoder over a borrowed manifest; safe to share across requests
#[derive(Debug, Clone, Copy)]
pub struct OnlineEncoder<'m> {
    manifest: &'m FeatureManifest,
}

impl<'m> OnlineEncoder<'m> {
    pub fn new(manifest: &'m FeatureManifest) -> Self {
        Self { manifest }
    }

    /// Parse and encode a JSON request body
    pub fn encode_json(&self, body: &JsonValue) -> Result<Encoded, EncodeError> {
        let record = RawRecord::from_json(body)?;
        Ok(self.encode(&record))
    }

    pub fn encode(&self, record: &RawRecord) -> Encoded {
        let mut values = vec![0.0; self.manifest.len()];
        let mut diagnostics = Vec::new();
        let mut missing = Vec::new();

        for (field, binding) in self.manifest.bindings() {
            let Some(value) = record.get(field) else {
                apply_absent(binding, &mut values);
                missing.push(field.to_string());
                continue;
            };
            match binding {
                FieldBinding::Numeric { column, sentinels } => {
                    let Some(index) = column else { continue };
                    match value.as_number() {
                        Some(x) if is_sentinel(sentinels, x) => {
                            values[*index] = absent::NUMERIC;
                            diagnostics.push(Diagnostic::SentinelCode {
                                field: field.to_string(),
                                value: value.to_string(),
                            });
                        }
                        Some(x) => values[*index] = x,
                        None => {
                            values[*index] = absent::NUMERIC;
                            diagnostics.push(Diagnostic::NumericCoercion {
                                field: field.to_string(),
                                value: value.to_string(),
                            });
                        }
                    }
                }
                FieldBinding::Flag {
                    columns,
                    true_label,
                    false_label,
                } => {
                    let truth = match value {
                        RawValue::Bool(b) => Some(*b),
                        RawValue::Text(s) if s.trim() == true_label => Some(true),
                        RawValue::Text(s) if s.trim() == false_label => Some(false),
                        _ => None,
                    };
                    if truth.is_none() {
                        diagnostics.push(Diagnostic::UnrecognizedFlag {
                            field: field.to_string(),
                            value: value.to_string(),
                        });
                    }
                    let x = if truth == Some(true) { 1.0 } else { absent::FLAG };
                    for &index in columns {
                        values[index] = x;
                    }
                }
                FieldBinding::Categorical {
                    reference,
                    indicators,
                    pruned,
                } => {
                    for (_, index) in indicators {
                        values[*index] = absent::INDICATOR;
                    }
                    // the bucket label is a batch artefact, never a request value
                    let label = value
                        .as_text()
                        .map(str::trim)
                        .filter(|l| *l != UNMAPPED_LABEL);
                    let hit =
                        label.and_then(|l| indicators.iter().find(|(known, _)| known == l));
                    match (label, hit) {
                        (_, Some((_, index))) => values[*index] = 1.0,
                        (Some(l), None) if l == reference => {}
                        (Some(l), None) if pruned.iter().any(|p| p == l) => {
                            log::debug!("{field} label {l} was pruned at training time");
                        }
                        _ => diagnostics.push(Diagnostic::UnknownCategory {
                            field: field.to_string(),
                            value: value.to_string(),
                        }),
                    }
                }
            }
        }

        for key in record.keys() {
            if self.manifest.binding(key).is_none() {
                log::debug!("Ignoring unrecognised record key: {key}");
            }
        }
        for d in &diagnostics {
            log::warn!("Online encoding: {d}");
        }

        Encoded {
            vector: FeatureVector(values),
            diagnostics,
            absent: missing,
        }
    }
}

fn is_sentinel(sentinels: &[String], x: f64) -> bool {
    sentinels
        .iter()
        .any(|s| s.trim().parse::<f64>().ok() == Some(x))
}

fn apply_absent(binding: &FieldBinding, values: &mut [f64]) {
    match binding {
        FieldBinding::Numeric { column, .. } => {
            if let Some(index) = column {
                values[*index] = absent::NUMERIC;
            }
        }
        FieldBinding::Flag { columns, .. } => {
            for &index in columns {
                values[index] = absent::FLAG;
            }
        }
        FieldBinding::Categorical { indicators, .. } => {
            for (_, index) in indicators {
                values[*index] = absent::INDICATOR;
            }
        }
    }
}
