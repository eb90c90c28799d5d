//! Batch encoder: raw natality rows to a design matrix and a frozen feature manifest.
//!
//! Stages, in order:
//! 1. outcome filtering (codes outside the outcome spec drop the row)
//! 2. categorical code mapping, with unmapped codes handled per [`UnmappedCodePolicy`]
//! 3. numeric coercion with sentinel removal and median imputation
//! 4. binary flags to 1.0 / 0.0
//! 5. drop-first indicator expansion, driven by the registry's label set
//! 6. degenerate-column removal, then correlation pruning
//!
//! Stage 6 needs every row before any column is final, so the whole batch is held in memory.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vbac_schema::{column_name, indicator_name, FieldKind, SchemaRegistry};

use crate::error::EncodeError;
use crate::manifest::{FeatureManifest, FieldBinding};
use crate::raw::RawTable;
use crate::stats::{is_constant, median, pearson, ColumnMoments};

/// Label given to unmapped categorical codes under [`UnmappedCodePolicy::Bucket`]
pub const UNMAPPED_LABEL: &str = "Unmapped";

/// Absolute Pearson correlation above which two columns are considered redundant
pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.95;

/// What to do with a categorical cell whose code is missing, a sentinel, or unmapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnmappedCodePolicy {
    /// Remove the whole row
    #[default]
    DropRow,
    /// Keep the row and give the cell its own `Unmapped` indicator
    Bucket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderOptions {
    pub correlation_threshold: f64,
    pub unmapped_codes: UnmappedCodePolicy,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            correlation_threshold: DEFAULT_CORRELATION_THRESHOLD,
            unmapped_codes: UnmappedCodePolicy::DropRow,
        }
    }
}

impl EncoderOptions {
    pub fn validate(&self) -> Result<(), EncodeError> {
        let t = self.correlation_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(EncodeError::InvalidOption(format!(
                "correlation_threshold must be in (0, 1], got {t}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imputation {
    pub cells: usize,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedDrop {
    pub dropped: String,
    pub kept: String,
    pub correlation: f64,
}

/// What the encoder did to the batch, for operators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodingReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_dropped_outcome: usize,
    pub rows_dropped_unmapped: usize,
    pub bucketed_cells: usize,
    pub imputed: BTreeMap<String, Imputation>,
    pub degenerate_columns: Vec<String>,
    pub correlated_columns: Vec<CorrelatedDrop>,
}

/// Encoded training data. `rows[i]` is laid out by `manifest`.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    pub manifest: FeatureManifest,
    pub rows: Vec<Vec<f64>>,
    pub outcome: Vec<bool>,
    pub report: EncodingReport,
}

impl DesignMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.manifest.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot<'a> {
    Numeric,
    Flag,
    Indicator(&'a str),
}

struct Candidate<'a> {
    name: String,
    field: usize,
    slot: Slot<'a>,
    values: Vec<f64>,
}

pub struct OfflineEncoder<'a> {
    registry: &'a SchemaRegistry,
    options: EncoderOptions,
}

impl<'a> OfflineEncoder<'a> {
    pub fn new(registry: &'a SchemaRegistry, options: EncoderOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Encode a batch. Fails without partial output on any integrity problem.
    pub fn encode(&self, table: &RawTable) -> Result<DesignMatrix, EncodeError> {
        self.options.validate()?;
        if table.is_empty() {
            return Err(EncodeError::EmptyBatch);
        }

        let registry = self.registry;
        let fields = registry.fields();
        let mut positions = Vec::with_capacity(fields.len());
        for field in fields {
            let pos = table
                .column_index(&field.name)
                .ok_or_else(|| EncodeError::MissingColumn(field.name.clone()))?;
            positions.push(pos);
        }
        let outcome_spec = registry.outcome();
        let outcome_pos = table
            .column_index(&outcome_spec.name)
            .ok_or_else(|| EncodeError::MissingColumn(outcome_spec.name.clone()))?;
        for header in table.headers() {
            if !registry.contains(header) && *header != outcome_spec.name {
                log::debug!("Ignoring batch column not in registry: {header}");
            }
        }

        let mut report = EncodingReport {
            rows_read: table.len(),
            ..EncodingReport::default()
        };

        // Row filtering: outcome, then categorical codes.
        let mut kept: Vec<usize> = Vec::with_capacity(table.len());
        let mut outcome: Vec<bool> = Vec::with_capacity(table.len());
        let mut labels: Vec<Vec<Option<&'a str>>> = Vec::with_capacity(table.len());
        'rows: for row in 0..table.len() {
            let Some(y) = table
                .cell(row, outcome_pos)
                .and_then(|c| outcome_spec.classify(c))
            else {
                report.rows_dropped_outcome += 1;
                continue;
            };

            let mut row_labels: Vec<Option<&'a str>> = vec![None; fields.len()];
            for (fi, field) in fields.iter().enumerate() {
                let FieldKind::CategoricalCode(spec) = &field.kind else {
                    continue;
                };
                match table.cell(row, positions[fi]).and_then(|c| spec.label_for(c)) {
                    Some(label) => row_labels[fi] = Some(label),
                    None => match self.options.unmapped_codes {
                        UnmappedCodePolicy::DropRow => {
                            report.rows_dropped_unmapped += 1;
                            continue 'rows;
                        }
                        UnmappedCodePolicy::Bucket => {
                            report.bucketed_cells += 1;
                            row_labels[fi] = Some(UNMAPPED_LABEL);
                        }
                    },
                }
            }
            kept.push(row);
            outcome.push(y);
            labels.push(row_labels);
        }
        report.rows_kept = kept.len();

        let classes = match (outcome.iter().any(|&y| y), outcome.iter().any(|&y| !y)) {
            (true, true) => 2,
            (false, false) => 0,
            _ => 1,
        };
        if classes < 2 {
            return Err(EncodeError::DegenerateOutcome {
                classes,
                rows: kept.len(),
            });
        }

        // Candidate columns, in registry order.
        let mut candidates: Vec<Candidate<'a>> = Vec::new();
        for (fi, field) in fields.iter().enumerate() {
            match &field.kind {
                FieldKind::Numeric(spec) => {
                    let parsed: Vec<Option<f64>> = kept
                        .iter()
                        .map(|&row| {
                            table
                                .cell(row, positions[fi])
                                .filter(|c| !spec.is_sentinel(c))
                                .and_then(|c| c.parse::<f64>().ok())
                                .filter(|x| x.is_finite())
                        })
                        .collect();
                    let observed: Vec<f64> = parsed.iter().flatten().copied().collect();
                    let Some(fill) = median(&observed) else {
                        log::warn!("Numeric field {} has no observed values", field.name);
                        report.degenerate_columns.push(column_name(&field.name));
                        continue;
                    };
                    let missing = parsed.len() - observed.len();
                    if missing > 0 {
                        report.imputed.insert(
                            field.name.clone(),
                            Imputation {
                                cells: missing,
                                median: fill,
                            },
                        );
                    }
                    candidates.push(Candidate {
                        name: column_name(&field.name),
                        field: fi,
                        slot: Slot::Numeric,
                        values: parsed.into_iter().map(|x| x.unwrap_or(fill)).collect(),
                    });
                }
                FieldKind::BinaryFlag(spec) => {
                    let values = kept
                        .iter()
                        .map(|&row| match table.cell(row, positions[fi]) {
                            Some(c) if c == spec.true_code => 1.0,
                            _ => 0.0,
                        })
                        .collect();
                    candidates.push(Candidate {
                        name: column_name(&field.name),
                        field: fi,
                        slot: Slot::Flag,
                        values,
                    });
                }
                FieldKind::CategoricalCode(spec) => {
                    let mut indicator_labels = spec.indicator_labels();
                    if self.options.unmapped_codes == UnmappedCodePolicy::Bucket {
                        indicator_labels.push(UNMAPPED_LABEL);
                    }
                    for label in indicator_labels {
                        let values = labels
                            .iter()
                            .map(|row| if row[fi] == Some(label) { 1.0 } else { 0.0 })
                            .collect();
                        candidates.push(Candidate {
                            name: indicator_name(&field.name, label),
                            field: fi,
                            slot: Slot::Indicator(label),
                            values,
                        });
                    }
                }
            }
        }

        let mut dropped = vec![false; candidates.len()];
        for (i, c) in candidates.iter().enumerate() {
            if is_constant(&c.values) {
                dropped[i] = true;
                report.degenerate_columns.push(c.name.clone());
            }
        }

        self.prune_correlated(&candidates, &mut dropped, &mut report);

        let survivors: Vec<usize> = (0..candidates.len()).filter(|&i| !dropped[i]).collect();
        if survivors.is_empty() {
            return Err(EncodeError::NoUsableColumns);
        }

        let manifest = self.build_manifest(&candidates, &survivors)?;

        let rows = (0..kept.len())
            .map(|r| survivors.iter().map(|&c| candidates[c].values[r]).collect())
            .collect();

        log::info!(
            "Encoded {} of {} rows into {} columns ({} degenerate, {} correlated dropped)",
            report.rows_kept,
            report.rows_read,
            manifest.len(),
            report.degenerate_columns.len(),
            report.correlated_columns.len()
        );
        for (field, imp) in &report.imputed {
            log::info!(
                "Imputed {} cell(s) of {field} with median {}",
                imp.cells,
                imp.median
            );
        }

        Ok(DesignMatrix {
            manifest,
            rows,
            outcome,
            report,
        })
    }

    /// Visit columns in candidate order; of each pair above the threshold, drop the one
    /// with the lexicographically greater name.
    fn prune_correlated(
        &self,
        candidates: &[Candidate<'a>],
        dropped: &mut [bool],
        report: &mut EncodingReport,
    ) {
        let threshold = self.options.correlation_threshold;
        let moments: Vec<ColumnMoments> = candidates
            .iter()
            .map(|c| ColumnMoments::of(&c.values))
            .collect();

        for i in 0..candidates.len() {
            if dropped[i] {
                continue;
            }
            for j in (i + 1)..candidates.len() {
                if dropped[j] {
                    continue;
                }
                let r = pearson(
                    &candidates[i].values,
                    moments[i],
                    &candidates[j].values,
                    moments[j],
                );
                if r.abs() <= threshold {
                    continue;
                }
                let (drop, keep) = if candidates[i].name > candidates[j].name {
                    (i, j)
                } else {
                    (j, i)
                };
                dropped[drop] = true;
                log::info!(
                    "Dropping {} (|r| = {:.4} with {})",
                    candidates[drop].name,
                    r.abs(),
                    candidates[keep].name
                );
                report.correlated_columns.push(CorrelatedDrop {
                    dropped: candidates[drop].name.clone(),
                    kept: candidates[keep].name.clone(),
                    correlation: r,
                });
                if drop == i {
                    break;
                }
            }
        }
    }

    fn build_manifest(
        &self,
        candidates: &[Candidate<'a>],
        survivors: &[usize],
    ) -> Result<FeatureManifest, EncodeError> {
        let fields = self.registry.fields();
        let mut bindings: BTreeMap<String, FieldBinding> = BTreeMap::new();
        for field in fields {
            let binding = match &field.kind {
                FieldKind::Numeric(spec) => FieldBinding::Numeric {
                    column: None,
                    sentinels: spec.sentinels.clone(),
                },
                FieldKind::BinaryFlag(spec) => FieldBinding::Flag {
                    columns: Vec::new(),
                    true_label: spec.true_label.clone(),
                    false_label: spec.false_label.clone(),
                },
                FieldKind::CategoricalCode(spec) => FieldBinding::Categorical {
                    reference: spec.reference.clone(),
                    indicators: Vec::new(),
                    pruned: Vec::new(),
                },
            };
            bindings.insert(field.name.clone(), binding);
        }

        let mut columns = Vec::with_capacity(survivors.len());
        let mut position = vec![None; candidates.len()];
        for (out, &c) in survivors.iter().enumerate() {
            position[c] = Some(out);
            columns.push(candidates[c].name.clone());
        }

        for (c, candidate) in candidates.iter().enumerate() {
            let name = &fields[candidate.field].name;
            let Some(binding) = bindings.get_mut(name) else {
                continue;
            };
            match (binding, candidate.slot) {
                (FieldBinding::Numeric { column, .. }, Slot::Numeric) => *column = position[c],
                (FieldBinding::Flag { columns, .. }, Slot::Flag) => {
                    columns.extend(position[c]);
                }
                (
                    FieldBinding::Categorical {
                        indicators, pruned, ..
                    },
                    Slot::Indicator(label),
                ) => match position[c] {
                    Some(p) => indicators.push((label.to_string(), p)),
                    None => pruned.push(label.to_string()),
                },
                _ => unreachable!("candidate slot always matches its field kind"),
            }
        }
        let manifest = FeatureManifest::new(self.registry.version(), columns, bindings)?;
        manifest.validate_against(self.registry)?;
        Ok(manifest)
    }
}
