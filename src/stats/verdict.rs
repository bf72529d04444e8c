use serde::Serialize;

use super::TestKind;

/// Significance threshold shared by every test.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// The null hypothesis is rejected only when `p_value` falls strictly below
/// the threshold; `p == 0.05` fails to reject.
pub fn rejects_null(p_value: f64) -> bool {
    p_value < SIGNIFICANCE_LEVEL
}

/// Outcome of one hypothesis test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestVerdict {
    pub test: TestKind,
    /// What was tested, e.g. a group label or a pair "A vs B".
    pub subject: Option<String>,
    pub statistic: f64,
    pub p_value: f64,
    pub reject_null: bool,
}

impl TestVerdict {
    pub fn new(test: TestKind, statistic: f64, p_value: f64) -> Self {
        let p_value = p_value.clamp(0.0, 1.0);
        Self {
            test,
            subject: None,
            statistic,
            p_value,
            reject_null: rejects_null(p_value),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_fails_to_reject() {
        assert!(!rejects_null(0.05));
        assert!(!rejects_null(0.2));
        assert!(rejects_null(0.049));
        assert!(rejects_null(0.0));
    }

    #[test]
    fn test_new_clamps_p_value() {
        let v = TestVerdict::new(TestKind::MannWhitneyU, 3.0, 1.2);
        assert_eq!(v.p_value, 1.0);
        assert!(!v.reject_null);
        let v = TestVerdict::new(TestKind::Bartlett, 40.0, 1e-9).with_subject("all groups");
        assert!(v.reject_null);
        assert_eq!(v.subject.as_deref(), Some("all groups"));
    }
}
