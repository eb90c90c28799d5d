//! Read-only registry of field descriptors

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::field::{FieldDescriptor, FieldKind};

/// Outcome column and the codes that define the two classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSpec {
    pub name: String,
    /// Code of the positive class (successful VBAC)
    pub positive_code: String,
    /// Codes of the negative class; any code outside both sets removes the row
    pub negative_codes: Vec<String>,
}

impl OutcomeSpec {
    /// `Some(true)` for positive, `Some(false)` for negative, `None` for anything else
    pub fn classify(&self, code: &str) -> Option<bool> {
        let code = code.trim();
        if code == self.positive_code {
            Some(true)
        } else if self.negative_codes.iter().any(|c| c == code) {
            Some(false)
        } else {
            None
        }
    }
}

/// Process-wide description of every raw field.
///
/// Constructed once from static configuration and never mutated; the offline and online
/// encoders must be handed the same registry.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRegistry {
    version: String,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
    outcome: OutcomeSpec,
}

impl SchemaRegistry {
    /// Validate and index a set of descriptors
    pub fn new(
        version: impl Into<String>,
        fields: Vec<FieldDescriptor>,
        outcome: OutcomeSpec,
    ) -> Result<Self, SchemaError> {
        let mut index = HashMap::with_capacity(fields.len());
        let mut columns: HashMap<String, String> = HashMap::new();

        for (i, field) in fields.iter().enumerate() {
            if index.insert(field.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
            validate_kind(field)?;
            for column in field.candidate_columns() {
                if let Some(first) = columns.insert(column.clone(), field.name.clone()) {
                    return Err(SchemaError::ColumnNameCollision {
                        first,
                        second: field.name.clone(),
                        column,
                    });
                }
            }
        }

        if index.contains_key(&outcome.name) {
            return Err(SchemaError::OutcomeCollision(outcome.name));
        }
        if outcome.negative_codes.is_empty()
            || outcome.negative_codes.contains(&outcome.positive_code)
        {
            return Err(SchemaError::InvalidOutcome(outcome.name));
        }

        Ok(Self {
            version: version.into(),
            fields,
            index,
            outcome,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Descriptor for `name`, or `None` when the registry does not define it
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Fields in declaration order; this order fixes candidate column order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn outcome(&self) -> &OutcomeSpec {
        &self.outcome
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn validate_kind(field: &FieldDescriptor) -> Result<(), SchemaError> {
    match &field.kind {
        FieldKind::Numeric(_) => Ok(()),
        FieldKind::BinaryFlag(spec) => {
            if spec.true_label == spec.false_label {
                return Err(SchemaError::AmbiguousFlagLabels {
                    field: field.name.clone(),
                    label: spec.true_label.clone(),
                });
            }
            Ok(())
        }
        FieldKind::CategoricalCode(spec) => {
            if spec.codes.is_empty() {
                return Err(SchemaError::EmptyVocabulary(field.name.clone()));
            }
            let mut seen: Vec<&str> = Vec::with_capacity(spec.codes.len());
            for entry in &spec.codes {
                if seen.contains(&entry.code.as_str()) {
                    return Err(SchemaError::DuplicateCode {
                        field: field.name.clone(),
                        code: entry.code.clone(),
                    });
                }
                if spec.sentinels.contains(&entry.code) {
                    return Err(SchemaError::SentinelCollision {
                        field: field.name.clone(),
                        code: entry.code.clone(),
                    });
                }
                seen.push(entry.code.as_str());
            }
            if !spec.has_label(&spec.reference) {
                return Err(SchemaError::UnknownReference {
                    field: field.name.clone(),
                    reference: spec.reference.clone(),
                });
            }
            Ok(())
        }
    }
}
