//! Raw inputs: single request records and CSV batches

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde_json::Value as JsonValue;

use crate::error::EncodeError;

/// One raw value as received, before any coercion
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Missing,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Arrays and objects; never valid for any field kind
    Nested(String),
}

impl RawValue {
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => RawValue::Missing,
            JsonValue::Bool(b) => RawValue::Bool(*b),
            JsonValue::Number(n) => n
                .as_f64()
                .map(RawValue::Number)
                .unwrap_or_else(|| RawValue::Text(n.to_string())),
            JsonValue::String(s) => RawValue::Text(s.clone()),
            other => RawValue::Nested(other.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, RawValue::Missing)
    }

    /// Coerce to a finite real number
    pub fn as_number(&self) -> Option<f64> {
        let x = match self {
            RawValue::Number(x) => *x,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        x.is_finite().then_some(x)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Missing => f.write_str("null"),
            RawValue::Text(s) => write!(f, "{s:?}"),
            RawValue::Number(x) => write!(f, "{x}"),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::Nested(s) => f.write_str(s),
        }
    }
}

/// A single subject's fields keyed by registry field name. Transient.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    values: BTreeMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON object; anything else is malformed
    pub fn from_json(value: &JsonValue) -> Result<Self, EncodeError> {
        let object = value.as_object().ok_or_else(|| {
            EncodeError::MalformedRecord(format!(
                "expected a JSON object keyed by field name, got {}",
                json_kind(value)
            ))
        })?;
        let values = object
            .iter()
            .map(|(k, v)| (k.clone(), RawValue::from_json(v)))
            .collect();
        Ok(Self { values })
    }

    pub fn with(mut self, name: &str, value: RawValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: RawValue) {
        self.values.insert(name.to_string(), value);
    }

    /// Value for `name`; explicit nulls count as absent
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.values.get(name).filter(|v| !v.is_missing())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Batch of raw rows with string cells; empty cells are missing values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<(), EncodeError> {
        if row.len() != self.headers.len() {
            return Err(EncodeError::RaggedRow {
                row: self.rows.len(),
                found: row.len(),
                expected: self.headers.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, EncodeError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let mut table = RawTable::new(headers);
        for record in rdr.records() {
            let record = record?;
            table.push_row(record.iter().map(str::to_string).collect())?;
        }
        log::debug!(
            "Loaded batch with {} columns and {} rows",
            table.headers.len(),
            table.rows.len()
        );
        Ok(table)
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, EncodeError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_csv_reader(std::io::BufReader::new(file))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Cell at (row, column); `None` when empty
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
