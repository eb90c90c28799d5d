//! The frozen feature manifest and its field-to-column bindings

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use vbac_schema::{column_name, indicator_name, FieldKind, FieldKindTag, SchemaRegistry};

use crate::error::ManifestError;

/// How one registry field maps onto manifest positions.
///
/// Built once by the offline encoder; the online encoder only ever follows these
/// bindings and never matches column names by pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldBinding {
    Numeric {
        /// `None` when the column was pruned during training
        column: Option<usize>,
        /// Registry codes meaning "not stated"; treated as unusable online
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        sentinels: Vec<String>,
    },
    Flag {
        columns: Vec<usize>,
        true_label: String,
        false_label: String,
    },
    Categorical {
        reference: String,
        /// Retained indicators as (label, column index)
        indicators: Vec<(String, usize)>,
        /// Known labels whose indicator was pruned; encode as all zeros
        pruned: Vec<String>,
    },
}

impl FieldBinding {
    pub fn tag(&self) -> FieldKindTag {
        match self {
            FieldBinding::Numeric { .. } => FieldKindTag::Numeric,
            FieldBinding::Flag { .. } => FieldKindTag::BinaryFlag,
            FieldBinding::Categorical { .. } => FieldKindTag::CategoricalCode,
        }
    }

    /// Manifest positions this binding writes to
    pub fn columns(&self) -> Vec<usize> {
        match self {
            FieldBinding::Numeric { column, .. } => column.iter().copied().collect(),
            FieldBinding::Flag { columns, .. } => columns.clone(),
            FieldBinding::Categorical { indicators, .. } => {
                indicators.iter().map(|(_, i)| *i).collect()
            }
        }
    }
}

/// Ordered column names defining the layout of every feature vector.
///
/// Deserialising runs the same layout checks as [`FeatureManifest::new`], so a
/// decoded manifest never binds a position outside its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ManifestRepr")]
pub struct FeatureManifest {
    schema_version: String,
    columns: Vec<String>,
    bindings: BTreeMap<String, FieldBinding>,
}

#[derive(Deserialize)]
struct ManifestRepr {
    schema_version: String,
    columns: Vec<String>,
    bindings: BTreeMap<String, FieldBinding>,
}

impl TryFrom<ManifestRepr> for FeatureManifest {
    type Error = ManifestError;

    fn try_from(repr: ManifestRepr) -> Result<Self, Self::Error> {
        Self::new(repr.schema_version, repr.columns, repr.bindings)
    }
}

impl FeatureManifest {
    /// Assemble a manifest; checks internal consistency but not the registry
    pub fn new(
        schema_version: impl Into<String>,
        columns: Vec<String>,
        bindings: BTreeMap<String, FieldBinding>,
    ) -> Result<Self, ManifestError> {
        let manifest = Self {
            schema_version: schema_version.into(),
            columns,
            bindings,
        };
        manifest.check_layout()?;
        Ok(manifest)
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn binding(&self, field: &str) -> Option<&FieldBinding> {
        self.bindings.get(field)
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, &FieldBinding)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every column bound exactly once, indices in range, no duplicate names
    fn check_layout(&self) -> Result<(), ManifestError> {
        let mut seen: HashMap<&str, ()> = HashMap::with_capacity(self.columns.len());
        for column in &self.columns {
            if seen.insert(column.as_str(), ()).is_some() {
                return Err(ManifestError::DuplicateColumn(column.clone()));
            }
        }

        let mut counts = vec![0usize; self.columns.len()];
        for binding in self.bindings.values() {
            for index in binding.columns() {
                let slot = counts
                    .get_mut(index)
                    .ok_or(ManifestError::IndexOutOfRange {
                        index,
                        len: self.columns.len(),
                    })?;
                *slot += 1;
            }
        }
        for (index, count) in counts.into_iter().enumerate() {
            if count != 1 {
                return Err(ManifestError::ColumnBindingCount {
                    column: self.columns[index].clone(),
                    count,
                });
            }
        }
        Ok(())
    }

    /// Check the manifest against the registry it claims to have been built from.
    ///
    /// Any disagreement is a schema mismatch: the manifest must not be used.
    pub fn validate_against(&self, registry: &SchemaRegistry) -> Result<(), ManifestError> {
        if self.schema_version != registry.version() {
            return Err(ManifestError::VersionMismatch {
                manifest: self.schema_version.clone(),
                registry: registry.version().to_string(),
            });
        }
        self.check_layout()?;

        for name in self.bindings.keys() {
            if !registry.contains(name) {
                return Err(ManifestError::UnknownField(name.clone()));
            }
        }

        for field in registry.fields() {
            let binding = self
                .bindings
                .get(&field.name)
                .ok_or_else(|| ManifestError::UnboundField(field.name.clone()))?;
            if binding.tag() != field.tag() {
                return Err(ManifestError::KindMismatch {
                    field: field.name.clone(),
                    bound: binding.tag(),
                    declared: field.tag(),
                });
            }
            match (&field.kind, binding) {
                (FieldKind::Numeric(spec), FieldBinding::Numeric { column, sentinels }) => {
                    if *sentinels != spec.sentinels {
                        return Err(ManifestError::SentinelMismatch(field.name.clone()));
                    }
                    if let Some(index) = column {
                        self.expect_name(*index, &column_name(&field.name))?;
                    }
                }
                (FieldKind::BinaryFlag(_), FieldBinding::Flag { columns, .. }) => {
                    for &index in columns {
                        self.expect_name(index, &column_name(&field.name))?;
                    }
                }
                (
                    FieldKind::CategoricalCode(spec),
                    FieldBinding::Categorical {
                        reference,
                        indicators,
                        pruned,
                    },
                ) => {
                    if *reference != spec.reference {
                        return Err(ManifestError::ReferenceMismatch {
                            field: field.name.clone(),
                            manifest: reference.clone(),
                            registry: spec.reference.clone(),
                        });
                    }
                    for (label, index) in indicators {
                        self.expect_name(*index, &indicator_name(&field.name, label))?;
                    }
                    let labels = indicators.iter().map(|(l, _)| l).chain(pruned.iter());
                    for label in labels {
                        if !spec.has_label(label) && label != crate::offline::UNMAPPED_LABEL {
                            return Err(ManifestError::UnknownCategory {
                                field: field.name.clone(),
                                label: label.clone(),
                            });
                        }
                    }
                }
                _ => unreachable!("kind tags already compared"),
            }
        }
        Ok(())
    }

    fn expect_name(&self, index: usize, expected: &str) -> Result<(), ManifestError> {
        let actual = self
            .columns
            .get(index)
            .ok_or(ManifestError::IndexOutOfRange {
                index,
                len: self.columns.len(),
            })?;
        if actual != expected {
            return Err(ManifestError::ColumnNameMismatch {
                index,
                expected: expected.to_string(),
                actual: actual.clone(),
            });
        }
        Ok(())
    }
}
