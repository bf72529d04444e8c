use std::collections::{HashMap, HashSet};

use super::model::{DataError, Dataset, FieldValue};

// ---------------------------------------------------------------------------
// GroupSample: metric values of one group label
// ---------------------------------------------------------------------------

/// The metric values belonging to one group label, in dataset order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSample {
    pub label: FieldValue,
    pub values: Vec<f64>,
}

impl GroupSample {
    pub fn new(label: impl Into<FieldValue>, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Split `dataset` by `group_field`, collecting `metric_field` per group.
///
/// Groups come out in the order their label first appears. Every record must
/// carry both fields and the metric must be numeric.
pub fn partition(
    dataset: &Dataset,
    group_field: &str,
    metric_field: &str,
) -> Result<Vec<GroupSample>, DataError> {
    let mut samples: Vec<GroupSample> = Vec::new();
    let mut index: HashMap<FieldValue, usize> = HashMap::new();

    for (row, obs) in dataset.observations.iter().enumerate() {
        let label = obs
            .get(group_field)
            .ok_or_else(|| DataError::MissingField {
                row,
                field: group_field.to_string(),
            })?;
        let value = obs.numeric(metric_field, row)?;

        let slot = *index.entry(label.clone()).or_insert_with(|| {
            samples.push(GroupSample::new(label.clone(), Vec::new()));
            samples.len() - 1
        });
        samples[slot].values.push(value);
    }

    log::debug!(
        "partitioned {} rows by '{group_field}' into {} groups",
        dataset.len(),
        samples.len()
    );
    Ok(samples)
}

static MISSING: FieldValue = FieldValue::Null;

/// Distinct values of `field` in first-seen order. Records lacking the field
/// contribute `Null`.
pub fn distinct_values(dataset: &Dataset, field: &str) -> Vec<FieldValue> {
    distinct_values_up_to(dataset, field, usize::MAX)
}

/// Like [`distinct_values`] but stops scanning once `limit` values are found.
pub fn distinct_values_up_to(dataset: &Dataset, field: &str, limit: usize) -> Vec<FieldValue> {
    let mut seen: HashSet<&FieldValue> = HashSet::new();
    let mut out = Vec::new();
    for obs in &dataset.observations {
        if out.len() >= limit {
            break;
        }
        let v = obs.get(field).unwrap_or(&MISSING);
        if seen.insert(v) {
            out.push(v.clone());
        }
    }
    out
}
