use itertools::Itertools;
use serde::Serialize;

use super::hypothesis;
use super::selector::select_test;
use super::{StatsError, TestKind, TestVerdict};
use crate::data::partition::GroupSample;

fn group_slices(samples: &[GroupSample]) -> Vec<&[f64]> {
    samples.iter().map(|s| s.values.as_slice()).collect()
}

fn all_groups_subject(samples: &[GroupSample]) -> String {
    samples.iter().map(|s| s.label.to_string()).join(", ")
}

fn pair_subject(a: &GroupSample, b: &GroupSample) -> String {
    format!("{} vs {}", a.label, b.label)
}

/// Choose the group-difference test for `samples` and run it.
pub fn compare_groups(samples: &[GroupSample], paired: bool) -> Result<TestVerdict, StatsError> {
    let kind = select_test(samples.len(), paired)?;
    let verdict = match kind {
        TestKind::KruskalWallis => hypothesis::kruskal_wallis(&group_slices(samples))?
            .with_subject(all_groups_subject(samples)),
        TestKind::WilcoxonSignedRank => {
            hypothesis::wilcoxon_signed_rank(&samples[0].values, &samples[1].values)?
                .with_subject(pair_subject(&samples[0], &samples[1]))
        }
        _ => hypothesis::mann_whitney_u(&samples[0].values, &samples[1].values)?
            .with_subject(pair_subject(&samples[0], &samples[1])),
    };
    log::debug!("{kind}: p = {:.6}", verdict.p_value);
    Ok(verdict)
}

/// Mann-Whitney U between every unordered pair of groups, in first-seen
/// combination order: (A,B), (A,C), (B,C), ...
pub fn pairwise_mann_whitney(samples: &[GroupSample]) -> Result<Vec<TestVerdict>, StatsError> {
    if samples.len() < 2 {
        return Err(StatsError::TooFewGroups {
            required: 2,
            actual: samples.len(),
        });
    }
    samples
        .iter()
        .tuple_combinations()
        .map(|(a, b)| {
            hypothesis::mann_whitney_u(&a.values, &b.values)
                .map(|v| v.with_subject(pair_subject(a, b)))
        })
        .collect()
}

/// KS test of each group against a normal fitted to that group.
pub fn normality_by_group(samples: &[GroupSample]) -> Result<Vec<TestVerdict>, StatsError> {
    samples
        .iter()
        .map(|s| hypothesis::ks_normal(&s.values).map(|v| v.with_subject(s.label.to_string())))
        .collect()
}

/// One Bartlett test across all groups at once.
pub fn homogeneity_of_variance(samples: &[GroupSample]) -> Result<TestVerdict, StatsError> {
    Ok(hypothesis::bartlett(&group_slices(samples))?.with_subject(all_groups_subject(samples)))
}

/// Student's t-test; only defined for exactly two groups.
pub fn t_test_two_groups(samples: &[GroupSample]) -> Result<TestVerdict, StatsError> {
    if samples.len() != 2 {
        return Err(StatsError::WrongGroupCount {
            test: TestKind::StudentT,
            expected: 2,
            actual: samples.len(),
        });
    }
    Ok(hypothesis::student_t(&samples[0].values, &samples[1].values)?
        .with_subject(pair_subject(&samples[0], &samples[1])))
}

/// Results of the whole battery. Each test keeps its own outcome so one
/// failure does not hide the rest.
#[derive(Debug, Clone, Serialize)]
pub struct Battery {
    #[serde(serialize_with = "serialize_outcome")]
    pub normality: Result<Vec<TestVerdict>, StatsError>,
    #[serde(serialize_with = "serialize_outcome")]
    pub homogeneity: Result<TestVerdict, StatsError>,
    #[serde(serialize_with = "serialize_outcome")]
    pub comparison: Result<TestVerdict, StatsError>,
    /// Only run for more than two groups.
    #[serde(serialize_with = "serialize_optional_outcome")]
    pub pairwise: Option<Result<Vec<TestVerdict>, StatsError>>,
}

impl Battery {
    /// All successful verdicts, in report order.
    pub fn verdicts(&self) -> Vec<&TestVerdict> {
        let mut out: Vec<&TestVerdict> = Vec::new();
        if let Ok(vs) = &self.normality {
            out.extend(vs);
        }
        if let Ok(v) = &self.homogeneity {
            out.push(v);
        }
        if let Ok(v) = &self.comparison {
            out.push(v);
        }
        if let Some(Ok(vs)) = &self.pairwise {
            out.extend(vs);
        }
        out
    }

    /// All failures, in report order.
    pub fn errors(&self) -> Vec<&StatsError> {
        let mut out = Vec::new();
        if let Err(e) = &self.normality {
            out.push(e);
        }
        if let Err(e) = &self.homogeneity {
            out.push(e);
        }
        if let Err(e) = &self.comparison {
            out.push(e);
        }
        if let Some(Err(e)) = &self.pairwise {
            out.push(e);
        }
        out
    }
}

fn serialize_outcome<T: Serialize, S: serde::Serializer>(
    outcome: &Result<T, StatsError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    #[serde(rename_all = "lowercase")]
    enum Outcome<'a, T> {
        Ok(&'a T),
        Error(String),
    }
    match outcome {
        Ok(v) => Outcome::Ok(v).serialize(serializer),
        Err(e) => Outcome::<T>::Error(e.to_string()).serialize(serializer),
    }
}

fn serialize_optional_outcome<T: Serialize, S: serde::Serializer>(
    outcome: &Option<Result<T, StatsError>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match outcome {
        Some(o) => serialize_outcome(o, serializer),
        None => serializer.serialize_none(),
    }
}

/// Run normality, homogeneity and the selected comparison, plus the pairwise
/// sweep when there are more than two groups.
pub fn run_battery(samples: &[GroupSample], paired: bool) -> Battery {
    let battery = Battery {
        normality: normality_by_group(samples),
        homogeneity: homogeneity_of_variance(samples),
        comparison: compare_groups(samples, paired),
        pairwise: (samples.len() > 2).then(|| pairwise_mann_whitney(samples)),
    };
    log::info!(
        "battery over {} groups: {} verdicts, {} failures",
        samples.len(),
        battery.verdicts().len(),
        battery.errors().len()
    );
    battery
}
