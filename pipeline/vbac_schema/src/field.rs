//! Field descriptors: one per raw clinical field

use serde::{Deserialize, Serialize};

use crate::naming::{column_name, indicator_name};

/// Kind tag of a field, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKindTag {
    Numeric,
    CategoricalCode,
    BinaryFlag,
}

impl std::fmt::Display for FieldKindTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FieldKindTag::Numeric => "numeric",
            FieldKindTag::CategoricalCode => "categorical",
            FieldKindTag::BinaryFlag => "binary",
        };
        f.write_str(s)
    }
}

/// A continuous or count-valued field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NumericSpec {
    /// Raw codes meaning "unknown / not stated"; never coerced to numbers
    #[serde(default)]
    pub sentinels: Vec<String>,
}

impl NumericSpec {
    /// Whether a raw cell is an "unknown" code, compared textually and numerically
    pub fn is_sentinel(&self, raw: &str) -> bool {
        let raw = raw.trim();
        let parsed = raw.parse::<f64>().ok();
        self.sentinels.iter().any(|s| {
            s == raw
                || matches!(
                    (parsed, s.parse::<f64>().ok()),
                    (Some(a), Some(b)) if a == b
                )
        })
    }
}

/// One literal `code -> label` entry of a categorical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLabel {
    pub code: String,
    pub label: String,
}

/// A coded categorical field, expanded into drop-first indicators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalSpec {
    /// Literal mapping, in display order. Codes are unique; labels may repeat.
    pub codes: Vec<CodeLabel>,
    /// Label omitted from the indicator expansion
    pub reference: String,
    #[serde(default)]
    pub sentinels: Vec<String>,
}

impl CategoricalSpec {
    /// Label for a raw code, or `None` for unmapped codes (sentinels included)
    pub fn label_for(&self, code: &str) -> Option<&str> {
        let code = code.trim();
        self.codes
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.label.as_str())
    }

    /// Distinct labels in first-appearance order
    pub fn labels(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(self.codes.len());
        for c in &self.codes {
            if !out.contains(&c.label.as_str()) {
                out.push(c.label.as_str());
            }
        }
        out
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.codes.iter().any(|c| c.label == label)
    }

    /// Labels that receive an indicator column (all but the reference)
    pub fn indicator_labels(&self) -> Vec<&str> {
        self.labels()
            .into_iter()
            .filter(|l| *l != self.reference)
            .collect()
    }

    pub fn is_sentinel(&self, code: &str) -> bool {
        let code = code.trim();
        self.sentinels.iter().any(|s| s == code)
    }
}

/// A yes/no field. Raw batches carry codes, requests carry labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSpec {
    /// Raw code that counts as true in batch data; every other code is false
    pub true_code: String,
    /// Request label that counts as true
    pub true_label: String,
    /// Request label that counts as false
    pub false_label: String,
}

impl Default for FlagSpec {
    fn default() -> Self {
        Self {
            true_code: "Y".into(),
            true_label: "Yes".into(),
            false_label: "No".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Numeric(NumericSpec),
    CategoricalCode(CategoricalSpec),
    BinaryFlag(FlagSpec),
}

impl FieldKind {
    pub fn tag(&self) -> FieldKindTag {
        match self {
            FieldKind::Numeric(_) => FieldKindTag::Numeric,
            FieldKind::CategoricalCode(_) => FieldKindTag::CategoricalCode,
            FieldKind::BinaryFlag(_) => FieldKindTag::BinaryFlag,
        }
    }
}

/// Description of a single raw input field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Key as it appears in batch headers and request JSON
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn numeric(name: &str, sentinels: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Numeric(NumericSpec {
                sentinels: sentinels.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    pub fn flag(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::BinaryFlag(FlagSpec::default()),
        }
    }

    pub fn categorical(
        name: &str,
        codes: &[(&str, &str)],
        reference: &str,
        sentinels: &[&str],
    ) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::CategoricalCode(CategoricalSpec {
                codes: codes
                    .iter()
                    .map(|(code, label)| CodeLabel {
                        code: code.to_string(),
                        label: label.to_string(),
                    })
                    .collect(),
                reference: reference.to_string(),
                sentinels: sentinels.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    pub fn tag(&self) -> FieldKindTag {
        self.kind.tag()
    }

    /// Every column name this field can produce before any pruning
    pub fn candidate_columns(&self) -> Vec<String> {
        match &self.kind {
            FieldKind::Numeric(_) | FieldKind::BinaryFlag(_) => vec![column_name(&self.name)],
            FieldKind::CategoricalCode(spec) => spec
                .indicator_labels()
                .into_iter()
                .map(|label| indicator_name(&self.name, label))
                .collect(),
        }
    }
}
