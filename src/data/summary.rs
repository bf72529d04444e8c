use super::model::{Dataset, FieldValue};

/// One equal-width histogram bin.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Bin `values` into `bins` equal-width intervals spanning `[min, max]`.
///
/// The last bin is closed on the right. A constant sample gets a single bin of
/// width 1 centred on the value. Non-finite values are ignored.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    match value_range(values) {
        Some(range) => histogram_in_range(values, bins, range),
        None => Vec::new(),
    }
}

/// Finite `(min, max)` of `values`, if any.
pub fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Like [`histogram`] but with fixed edges, so several groups can share bins.
/// Values outside `range` are ignored.
pub fn histogram_in_range(values: &[f64], bins: usize, range: (f64, f64)) -> Vec<HistogramBin> {
    let (min, max) = range;
    let finite: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v >= min && *v <= max)
        .collect();
    if bins == 0 || !(max >= min) {
        return Vec::new();
    }

    if (max - min).abs() < f64::EPSILON {
        return vec![HistogramBin {
            start: min - 0.5,
            end: min + 0.5,
            count: finite.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + i as f64 * width,
            end: if i + 1 == bins {
                max
            } else {
                min + (i + 1) as f64 * width
            },
            count: 0,
        })
        .collect();

    for v in finite {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Count records per distinct value of `field`, in first-seen order.
/// Records without the field are counted under `Null`.
pub fn category_counts(dataset: &Dataset, field: &str) -> Vec<(FieldValue, usize)> {
    let mut counts: Vec<(FieldValue, usize)> = Vec::new();
    for obs in &dataset.observations {
        let value = obs.get(field).cloned().unwrap_or(FieldValue::Null);
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Observation;

    #[test]
    fn test_histogram_counts_every_value() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 10.0];
        let bins = histogram(&values, 5);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[4].end, 10.0);
        // max lands in the last bin
        assert_eq!(bins[4].count, 1);
        assert_eq!(bins[0].count, 2);
    }

    #[test]
    fn test_histogram_constant_and_empty() {
        let bins = histogram(&[7.0, 7.0, 7.0], 10);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 3);
        assert_eq!(bins[0].center(), 7.0);
        assert!(histogram(&[], 10).is_empty());
        assert!(histogram(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn test_shared_range_drops_outside_values() {
        let bins = histogram_in_range(&[1.0, 2.0, 3.0, 50.0], 2, (0.0, 4.0));
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[1].count, 2);
        assert_eq!(bins[1].width(), 2.0);
        assert_eq!(value_range(&[3.0, f64::NAN, -1.0]), Some((-1.0, 3.0)));
        assert_eq!(value_range(&[]), None);
    }

    #[test]
    fn test_category_counts_first_seen_order() {
        let ds = Dataset::from_observations(
            vec![
                Observation::new().with("status", "incomplete viewing"),
                Observation::new().with("status", "complete viewing"),
                Observation::new().with("status", "incomplete viewing"),
                Observation::new(),
            ],
            &[],
        );
        let counts = category_counts(&ds, "status");
        assert_eq!(
            counts,
            vec![
                (FieldValue::from("incomplete viewing"), 2),
                (FieldValue::from("complete viewing"), 1),
                (FieldValue::Null, 1),
            ]
        );
    }
}
