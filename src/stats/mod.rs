//! Hypothesis tests over grouped samples.
//!
//! ```text
//!   &[GroupSample] ──▶ selector ──▶ hypothesis::* ──▶ TestVerdict
//!                         │
//!                         └─ engine: pairwise sweep, normality, homogeneity, battery
//! ```

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub mod engine;
pub mod hypothesis;
mod rank;
pub mod selector;
pub mod verdict;

pub use engine::{
    compare_groups, homogeneity_of_variance, normality_by_group, pairwise_mann_whitney,
    run_battery, t_test_two_groups, Battery,
};
pub use selector::select_test;
pub use verdict::{rejects_null, TestVerdict, SIGNIFICANCE_LEVEL};

/// The hypothesis tests this crate knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TestKind {
    MannWhitneyU,
    WilcoxonSignedRank,
    KruskalWallis,
    KolmogorovSmirnovNormal,
    Bartlett,
    StudentT,
}

impl TestKind {
    pub fn name(&self) -> &'static str {
        match self {
            TestKind::MannWhitneyU => "Mann-Whitney U",
            TestKind::WilcoxonSignedRank => "Wilcoxon signed-rank",
            TestKind::KruskalWallis => "Kruskal-Wallis",
            TestKind::KolmogorovSmirnovNormal => "Kolmogorov-Smirnov (normal)",
            TestKind::Bartlett => "Bartlett",
            TestKind::StudentT => "Student's t",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("at least {required} groups are needed, found {actual}")]
    TooFewGroups { required: usize, actual: usize },
    #[error("{test} compares exactly {expected} groups, found {actual}")]
    WrongGroupCount {
        test: TestKind,
        expected: usize,
        actual: usize,
    },
    #[error("insufficient data for test {test}: need at least {required} observations, got {actual}")]
    InsufficientData {
        test: TestKind,
        required: usize,
        actual: usize,
    },
    #[error("{test} needs paired samples of equal length ({left} vs {right})")]
    LengthMismatch {
        test: TestKind,
        left: usize,
        right: usize,
    },
    #[error("{test} is undefined when the data has no spread")]
    ZeroVariance { test: TestKind },
    #[error("{test} received non-finite values")]
    NonFinite { test: TestKind },
    #[error("distribution error: {0}")]
    Distribution(String),
}

pub(crate) fn distribution_error(e: impl fmt::Display) -> StatsError {
    StatsError::Distribution(e.to_string())
}
