//! Natural-language rendering of test verdicts.

use std::fmt::Write as _;

use crate::stats::{Battery, TestKind, TestVerdict, SIGNIFICANCE_LEVEL};

/// The conclusion sentence for a verdict.
pub fn conclusion(verdict: &TestVerdict) -> String {
    match (verdict.test, verdict.reject_null) {
        (TestKind::KolmogorovSmirnovNormal, false) => {
            "fail to reject the null hypothesis: the sample is consistent with a normal distribution"
                .to_string()
        }
        (TestKind::KolmogorovSmirnovNormal, true) => {
            "reject the null hypothesis: the sample does not follow a normal distribution"
                .to_string()
        }
        (TestKind::Bartlett, false) => {
            "fail to reject the null hypothesis: variances are equal across groups".to_string()
        }
        (TestKind::Bartlett, true) => {
            "reject the null hypothesis: variances differ between groups".to_string()
        }
        (_, false) => {
            "fail to reject the null hypothesis: no significant difference between groups"
                .to_string()
        }
        (_, true) => "reject the null hypothesis: significant difference detected".to_string(),
    }
}

/// One line: test, subject, statistic, p-value and conclusion.
pub fn describe(verdict: &TestVerdict) -> String {
    let mut line = String::from(verdict.test.name());
    if let Some(subject) = &verdict.subject {
        let _ = write!(line, " [{subject}]");
    }
    let _ = write!(
        line,
        ": statistic = {:.4}, p-value = {} (alpha = {SIGNIFICANCE_LEVEL}). {}",
        verdict.statistic,
        format_p_value(verdict.p_value),
        conclusion(verdict)
    );
    line
}

/// Four decimals, switching to scientific notation below 1e-4.
pub fn format_p_value(p: f64) -> String {
    if p != 0.0 && p < 1e-4 {
        format!("{p:.4e}")
    } else {
        format!("{p:.4}")
    }
}

/// Render a full battery, including failed tests.
pub fn describe_battery(battery: &Battery) -> Vec<String> {
    let mut lines = Vec::new();
    let mut section = |title: &str, body: Vec<String>| {
        lines.push(format!("== {title}"));
        lines.extend(body);
    };

    section(
        "Normality (Kolmogorov-Smirnov)",
        match &battery.normality {
            Ok(vs) => vs.iter().map(describe).collect(),
            Err(e) => vec![format!("error: {e}")],
        },
    );
    section(
        "Homogeneity of variance (Bartlett)",
        vec![outcome_line(&battery.homogeneity)],
    );
    section("Group comparison", vec![outcome_line(&battery.comparison)]);
    if let Some(pairwise) = &battery.pairwise {
        section(
            "Pairwise Mann-Whitney U",
            match pairwise {
                Ok(vs) => vs.iter().map(describe).collect(),
                Err(e) => vec![format!("error: {e}")],
            },
        );
    }
    lines
}

fn outcome_line<E: std::fmt::Display>(outcome: &Result<TestVerdict, E>) -> String {
    match outcome {
        Ok(v) => describe(v),
        Err(e) => format!("error: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::partition::GroupSample;
    use crate::stats::run_battery;

    #[test]
    fn test_describe_rejecting_verdict() {
        let v = TestVerdict::new(TestKind::MannWhitneyU, 0.0, 0.0079).with_subject("a vs b");
        let line = describe(&v);
        assert!(line.starts_with("Mann-Whitney U [a vs b]: statistic = 0.0000, p-value = 0.0079"));
        assert!(line.ends_with("significant difference detected"));
    }

    #[test]
    fn test_tiny_p_values_stay_visible() {
        assert_eq!(format_p_value(0.0079), "0.0079");
        assert_eq!(format_p_value(1.0), "1.0000");
        assert_eq!(format_p_value(4.1229e-4), "0.0004");
        assert_eq!(format_p_value(3.2e-9), "3.2000e-9");
        let v = TestVerdict::new(TestKind::KruskalWallis, 40.0, 2.5e-12);
        assert!(describe(&v).contains("p-value = 2.5000e-12 "));
    }

    #[test]
    fn test_describe_boundary_fails_to_reject() {
        let v = TestVerdict::new(TestKind::KruskalWallis, 6.0, 0.05);
        assert!(describe(&v).contains("no significant difference between groups"));
    }

    #[test]
    fn test_conclusion_wording_per_test() {
        let ks = TestVerdict::new(TestKind::KolmogorovSmirnovNormal, 0.1, 0.8);
        assert!(conclusion(&ks).contains("consistent with a normal distribution"));
        let bartlett = TestVerdict::new(TestKind::Bartlett, 11.0, 0.001);
        assert!(conclusion(&bartlett).contains("variances differ"));
    }

    #[test]
    fn test_describe_battery_sections() {
        let samples = vec![
            GroupSample::new("a", vec![1.0, 2.0, 3.0, 4.0]),
            GroupSample::new("b", vec![2.0, 3.0, 4.0, 6.0]),
            GroupSample::new("c", vec![5.0, 7.0, 8.0, 9.0]),
        ];
        let lines = describe_battery(&run_battery(&samples, false));
        let headers: Vec<&String> = lines.iter().filter(|l| l.starts_with("==")).collect();
        assert_eq!(headers.len(), 4);
        assert!(lines.iter().any(|l| l.starts_with("Kruskal-Wallis [a, b, c]")));
    }
}
