use std::collections::{BTreeMap, HashSet};
use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// FieldValue – a single cell of a record
// ---------------------------------------------------------------------------

/// A dynamically-typed field value mirroring common DataFrame / SQL dtypes.
/// Used as a map key for group labels, so `FieldValue` must be `Ord` + `Hash`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text for simplicity.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so we can put FieldValue in ordered collections --

impl Eq for FieldValue {}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use FieldValue::*;
        fn discriminant(v: &FieldValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for FieldValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FieldValue::String(s) | FieldValue::Date(s) => s.hash(state),
            FieldValue::Integer(i) => i.hash(state),
            FieldValue::Float(f) => f.to_bits().hash(state),
            FieldValue::Bool(b) => b.hash(state),
            FieldValue::Null => {}
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Date(d) => write!(f, "{d}"),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Integer(i as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl FieldValue {
    /// Interpret the value as an `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors raised when a record does not have the expected shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("row {row}: field '{field}' is missing")]
    MissingField { row: usize, field: String },
    #[error("row {row}: field '{field}' is not numeric (found {found})")]
    NonNumeric {
        row: usize,
        field: String,
        found: String,
    },
}

// ---------------------------------------------------------------------------
// Observation – one row of the source table
// ---------------------------------------------------------------------------

/// A single record (one row of the source table).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    /// Dynamic columns: column_name → value.
    pub fields: BTreeMap<String, FieldValue>,
}

impl Observation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for constructing fixtures.
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Numeric value of `field`, with the row index used for error reporting.
    pub fn numeric(&self, field: &str, row: usize) -> Result<f64, DataError> {
        let value = self.fields.get(field).ok_or_else(|| DataError::MissingField {
            row,
            field: field.to_string(),
        })?;
        value.as_f64().ok_or_else(|| DataError::NonNumeric {
            row,
            field: field.to_string(),
            found: value.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// All records (rows), in load order.
    pub observations: Vec<Observation>,
    /// Column names in first-seen order.
    pub column_names: Vec<String>,
}

impl Dataset {
    /// Build the column index from the loaded records.
    ///
    /// `preferred_order` lists columns in their source order (CSV header,
    /// Parquet schema, SQL result columns). Columns that only show up in the
    /// records are appended in first-seen order.
    pub fn from_observations(observations: Vec<Observation>, preferred_order: &[String]) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let mut column_names = Vec::new();
        for col in preferred_order {
            if seen.insert(col.clone()) {
                column_names.push(col.clone());
            }
        }
        for obs in &observations {
            for col in obs.fields.keys() {
                if seen.insert(col.clone()) {
                    column_names.push(col.clone());
                }
            }
        }
        Dataset {
            observations,
            column_names,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Columns holding at least one numeric value.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.column_names
            .iter()
            .filter(|col| {
                self.observations
                    .iter()
                    .any(|obs| obs.get(col).and_then(FieldValue::as_f64).is_some())
            })
            .cloned()
            .collect()
    }

    /// Add a column if not yet known.
    pub(crate) fn register_column(&mut self, name: &str) {
        if !self.column_names.iter().any(|c| c == name) {
            self.column_names.push(name.to_string());
        }
    }
}
