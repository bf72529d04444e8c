use std::fmt;

use super::model::{DataError, Dataset, FieldValue};

/// Whether a viewing reached the end of the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewingStatus {
    Complete,
    Incomplete,
}

impl ViewingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewingStatus::Complete => "complete viewing",
            ViewingStatus::Incomplete => "incomplete viewing",
        }
    }
}

impl fmt::Display for ViewingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A viewing is complete once the minutes watched reach the content duration.
pub fn label_viewing(minutes_watched: f64, duration: f64) -> ViewingStatus {
    if minutes_watched >= duration {
        ViewingStatus::Complete
    } else {
        ViewingStatus::Incomplete
    }
}

/// Label every record of `dataset`, writing the status text into `output_field`.
///
/// Returns the number of complete viewings. On error the dataset is left
/// untouched.
pub fn label_dataset(
    dataset: &mut Dataset,
    minutes_field: &str,
    duration_field: &str,
    output_field: &str,
) -> Result<usize, DataError> {
    let statuses = dataset
        .observations
        .iter()
        .enumerate()
        .map(|(row, obs)| {
            let minutes = obs.numeric(minutes_field, row)?;
            let duration = obs.numeric(duration_field, row)?;
            Ok(label_viewing(minutes, duration))
        })
        .collect::<Result<Vec<_>, DataError>>()?;

    let mut complete = 0;
    for (obs, status) in dataset.observations.iter_mut().zip(&statuses) {
        if *status == ViewingStatus::Complete {
            complete += 1;
        }
        obs.fields.insert(
            output_field.to_string(),
            FieldValue::String(status.as_str().to_string()),
        );
    }
    dataset.register_column(output_field);

    log::info!(
        "labelled {} viewings ({complete} complete) into '{output_field}'",
        statuses.len()
    );
    Ok(complete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Observation;

    #[test]
    fn test_equal_minutes_is_complete() {
        assert_eq!(label_viewing(30.0, 30.0).to_string(), "complete viewing");
        assert_eq!(label_viewing(31.5, 30.0), ViewingStatus::Complete);
    }

    #[test]
    fn test_short_viewing_is_incomplete() {
        assert_eq!(label_viewing(29.0, 30.0).to_string(), "incomplete viewing");
        assert_eq!(label_viewing(0.0, 0.5), ViewingStatus::Incomplete);
    }

    #[test]
    fn test_label_dataset_adds_column() {
        let mut ds = Dataset::from_observations(
            vec![
                Observation::new().with("minutes", 30).with("duration", 30),
                Observation::new().with("minutes", 12.5).with("duration", 45),
            ],
            &["minutes".to_string(), "duration".to_string()],
        );
        let complete = label_dataset(&mut ds, "minutes", "duration", "status").unwrap();
        assert_eq!(complete, 1);
        assert_eq!(ds.column_names.last().map(String::as_str), Some("status"));
        assert_eq!(
            ds.observations[1].get("status"),
            Some(&FieldValue::from("incomplete viewing"))
        );
    }

    #[test]
    fn test_label_dataset_leaves_data_untouched_on_error() {
        let mut ds = Dataset::from_observations(
            vec![
                Observation::new().with("minutes", 30).with("duration", 30),
                Observation::new().with("minutes", 10),
            ],
            &[],
        );
        let err = label_dataset(&mut ds, "minutes", "duration", "status").unwrap_err();
        assert!(matches!(err, DataError::MissingField { row: 1, .. }));
        assert!(ds.observations[0].get("status").is_none());
    }
}
