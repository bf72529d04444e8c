//! Two-sided hypothesis tests on raw samples.
//!
//! Rank tests use exact null distributions for small samples without ties and
//! a normal approximation otherwise. Every routine validates its input and
//! fails with [`StatsError`] instead of producing NaN p-values.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal, StudentsT};
use statrs::statistics::Statistics;

use super::rank::average_ranks;
use super::{distribution_error, StatsError, TestKind, TestVerdict};

/// Smallest per-group sample every test accepts.
pub const MIN_GROUP_SIZE: usize = 2;

/// Mann-Whitney uses the exact distribution up to this many observations per
/// sample (and no ties).
const EXACT_MANN_WHITNEY_MAX: usize = 8;

/// Wilcoxon uses the exact distribution up to this many non-zero differences
/// (and no ties or zeros).
const EXACT_WILCOXON_MAX: usize = 50;

fn ensure_size(test: TestKind, required: usize, actual: usize) -> Result<(), StatsError> {
    if actual < required {
        return Err(StatsError::InsufficientData {
            test,
            required,
            actual,
        });
    }
    Ok(())
}

fn ensure_finite(test: TestKind, samples: &[&[f64]]) -> Result<(), StatsError> {
    if samples.iter().any(|s| s.iter().any(|v| !v.is_finite())) {
        return Err(StatsError::NonFinite { test });
    }
    Ok(())
}

fn standard_normal() -> Result<Normal, StatsError> {
    Normal::new(0.0, 1.0).map_err(distribution_error)
}

fn chi_squared_sf(x: f64, df: f64) -> Result<f64, StatsError> {
    let dist = ChiSquared::new(df).map_err(distribution_error)?;
    Ok(dist.sf(x.max(0.0)))
}

// ---------------------------------------------------------------------------
// Mann-Whitney U
// ---------------------------------------------------------------------------

/// Mann-Whitney U test for two independent samples.
///
/// The statistic is U for the first sample. The asymptotic p-value uses tie
/// correction and a 0.5 continuity correction.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Result<TestVerdict, StatsError> {
    let test = TestKind::MannWhitneyU;
    ensure_size(test, MIN_GROUP_SIZE, a.len())?;
    ensure_size(test, MIN_GROUP_SIZE, b.len())?;
    ensure_finite(test, &[a, b])?;

    let (n1, n2) = (a.len(), b.len());
    let combined: Vec<f64> = a.iter().chain(b).copied().collect();
    let (ranks, tie_term) = average_ranks(&combined);

    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let r1: f64 = ranks[..n1].iter().sum();
    let u1 = r1 - n1f * (n1f + 1.0) / 2.0;
    let u_max = u1.max(n1f * n2f - u1);

    let p_value = if tie_term == 0.0 && n1.max(n2) <= EXACT_MANN_WHITNEY_MAX {
        let counts = mann_whitney_counts(n1, n2);
        let total: f64 = counts.iter().sum();
        let upper: f64 = counts.iter().skip(u_max.round() as usize).sum();
        2.0 * upper / total
    } else {
        let n = n1f + n2f;
        let mean = n1f * n2f / 2.0;
        let var = n1f * n2f / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
        if var <= 0.0 {
            return Err(StatsError::ZeroVariance { test });
        }
        let z = (u_max - mean - 0.5) / var.sqrt();
        2.0 * standard_normal()?.sf(z)
    };

    Ok(TestVerdict::new(test, u1, p_value))
}

/// Number of orderings of `n1 + n2` distinct values producing each U.
fn mann_whitney_counts(n1: usize, n2: usize) -> Vec<f64> {
    let mut table: Vec<Vec<Vec<f64>>> = vec![vec![Vec::new(); n2 + 1]; n1 + 1];
    for i in 0..=n1 {
        for j in 0..=n2 {
            let dist = if i == 0 || j == 0 {
                vec![1.0]
            } else {
                let mut d = vec![0.0; i * j + 1];
                for (u, c) in table[i - 1][j].iter().enumerate() {
                    d[u + j] += c;
                }
                for (u, c) in table[i][j - 1].iter().enumerate() {
                    d[u] += c;
                }
                d
            };
            table[i][j] = dist;
        }
    }
    std::mem::take(&mut table[n1][n2])
}

// ---------------------------------------------------------------------------
// Wilcoxon signed-rank
// ---------------------------------------------------------------------------

/// Wilcoxon signed-rank test for paired samples. Zero differences are
/// dropped; the statistic is min(W+, W−).
pub fn wilcoxon_signed_rank(x: &[f64], y: &[f64]) -> Result<TestVerdict, StatsError> {
    let test = TestKind::WilcoxonSignedRank;
    if x.len() != y.len() {
        return Err(StatsError::LengthMismatch {
            test,
            left: x.len(),
            right: y.len(),
        });
    }
    ensure_size(test, MIN_GROUP_SIZE, x.len())?;
    ensure_finite(test, &[x, y])?;

    let diffs: Vec<f64> = x
        .iter()
        .zip(y)
        .map(|(a, b)| a - b)
        .filter(|d| *d != 0.0)
        .collect();
    let had_zeros = diffs.len() != x.len();
    ensure_size(test, 1, diffs.len())?;

    let abs_diffs: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    let (ranks, tie_term) = average_ranks(&abs_diffs);

    let n = diffs.len();
    let nf = n as f64;
    let w_plus: f64 = diffs
        .iter()
        .zip(&ranks)
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, r)| r)
        .sum();
    let w_minus = nf * (nf + 1.0) / 2.0 - w_plus;
    let statistic = w_plus.min(w_minus);

    let p_value = if tie_term == 0.0 && !had_zeros && n <= EXACT_WILCOXON_MAX {
        let counts = signed_rank_counts(n);
        let total = 2f64.powi(n as i32);
        let lower: f64 = counts
            .iter()
            .take(statistic.round() as usize + 1)
            .sum();
        2.0 * lower / total
    } else {
        let mean = nf * (nf + 1.0) / 4.0;
        let var = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - tie_term / 48.0;
        if var <= 0.0 {
            return Err(StatsError::ZeroVariance { test });
        }
        let z = (statistic - mean) / var.sqrt();
        2.0 * standard_normal()?.sf(z.abs())
    };

    Ok(TestVerdict::new(test, statistic, p_value))
}

/// Number of sign assignments of ranks 1..=n giving each positive rank sum.
fn signed_rank_counts(n: usize) -> Vec<f64> {
    let max_sum = n * (n + 1) / 2;
    let mut counts = vec![0.0; max_sum + 1];
    counts[0] = 1.0;
    for rank in 1..=n {
        for s in (rank..=max_sum).rev() {
            counts[s] += counts[s - rank];
        }
    }
    counts
}

// ---------------------------------------------------------------------------
// Kruskal-Wallis
// ---------------------------------------------------------------------------

/// Kruskal-Wallis H test over k independent samples, tie-corrected,
/// H ~ χ²(k − 1).
pub fn kruskal_wallis(groups: &[&[f64]]) -> Result<TestVerdict, StatsError> {
    let test = TestKind::KruskalWallis;
    if groups.len() < 2 {
        return Err(StatsError::TooFewGroups {
            required: 2,
            actual: groups.len(),
        });
    }
    for g in groups {
        ensure_size(test, MIN_GROUP_SIZE, g.len())?;
    }
    ensure_finite(test, groups)?;

    let combined: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let (ranks, tie_term) = average_ranks(&combined);
    let nf = combined.len() as f64;

    let mut offset = 0;
    let mut weighted = 0.0;
    for g in groups {
        let rank_sum: f64 = ranks[offset..offset + g.len()].iter().sum();
        weighted += rank_sum * rank_sum / g.len() as f64;
        offset += g.len();
    }

    let correction = 1.0 - tie_term / (nf * nf * nf - nf);
    if correction <= 0.0 {
        return Err(StatsError::ZeroVariance { test });
    }
    let h = (12.0 / (nf * (nf + 1.0)) * weighted - 3.0 * (nf + 1.0)) / correction;
    let p_value = chi_squared_sf(h, (groups.len() - 1) as f64)?;

    Ok(TestVerdict::new(test, h, p_value))
}

// ---------------------------------------------------------------------------
// Kolmogorov-Smirnov against a fitted normal
// ---------------------------------------------------------------------------

/// One-sample KS test against a normal with the sample's maximum-likelihood
/// mean and standard deviation. The statistic is D = sup |Fₙ − F|.
pub fn ks_normal(sample: &[f64]) -> Result<TestVerdict, StatsError> {
    let test = TestKind::KolmogorovSmirnovNormal;
    ensure_size(test, MIN_GROUP_SIZE, sample.len())?;
    ensure_finite(test, &[sample])?;

    let mean = sample.iter().mean();
    let sd = sample.iter().population_std_dev();
    if !(sd > 0.0) {
        return Err(StatsError::ZeroVariance { test });
    }
    let fitted = Normal::new(mean, sd).map_err(distribution_error)?;

    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let nf = n as f64;

    let d = sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let f = fitted.cdf(x);
            ((i + 1) as f64 / nf - f).max(f - i as f64 / nf)
        })
        .fold(0.0, f64::max);

    let p_value = 1.0 - kolmogorov_cdf(n, d);
    Ok(TestVerdict::new(test, d, p_value))
}

/// P(Dₙ < d) for the one-sample two-sided KS statistic.
///
/// Marsaglia, Tsang & Wang (2003), "Evaluating Kolmogorov's distribution",
/// with their fast tail approximation for large n·d².
pub(crate) fn kolmogorov_cdf(n: usize, d: f64) -> f64 {
    if d <= 0.0 {
        return 0.0;
    }
    if d >= 1.0 {
        return 1.0;
    }
    let nf = n as f64;
    let s = d * d * nf;
    if s > 7.24 || (s > 3.76 && n > 99) {
        return 1.0 - 2.0 * (-(2.000071 + 0.331 / nf.sqrt() + 1.409 / nf) * s).exp();
    }

    let k = (nf * d) as usize + 1;
    let m = 2 * k - 1;
    let h = k as f64 - nf * d;

    let mut hm = vec![0.0; m * m];
    for i in 0..m {
        for j in 0..m {
            if i + 1 >= j {
                hm[i * m + j] = 1.0;
            }
        }
    }
    for i in 0..m {
        hm[i * m] -= h.powi(i as i32 + 1);
        hm[(m - 1) * m + i] -= h.powi((m - i) as i32);
    }
    if 2.0 * h - 1.0 > 0.0 {
        hm[(m - 1) * m] += (2.0 * h - 1.0).powi(m as i32);
    }
    for i in 0..m {
        for j in 0..m {
            if i + 1 > j {
                for g in 1..=(i + 1 - j) {
                    hm[i * m + j] /= g as f64;
                }
            }
        }
    }

    let (q, mut exponent) = matrix_power(&hm, 0, m, n);
    let mut s = q[(k - 1) * m + k - 1];
    for i in 1..=n {
        s = s * i as f64 / nf;
        if s < 1e-140 {
            s *= 1e140;
            exponent -= 140;
        }
    }
    (s * 10f64.powi(exponent)).clamp(0.0, 1.0)
}

fn matrix_multiply(a: &[f64], b: &[f64], m: usize) -> Vec<f64> {
    let mut c = vec![0.0; m * m];
    for i in 0..m {
        for j in 0..m {
            c[i * m + j] = (0..m).map(|k| a[i * m + k] * b[k * m + j]).sum();
        }
    }
    c
}

/// `a^n` with a decimal exponent carried separately to avoid overflow.
fn matrix_power(a: &[f64], a_exp: i32, m: usize, n: usize) -> (Vec<f64>, i32) {
    if n == 1 {
        return (a.to_vec(), a_exp);
    }
    let (half, half_exp) = matrix_power(a, a_exp, m, n / 2);
    let squared = matrix_multiply(&half, &half, m);
    let (mut v, mut v_exp) = if n % 2 == 0 {
        (squared, 2 * half_exp)
    } else {
        (matrix_multiply(a, &squared, m), a_exp + 2 * half_exp)
    };
    if v[(m / 2) * m + m / 2] > 1e140 {
        v.iter_mut().for_each(|x| *x *= 1e-140);
        v_exp += 140;
    }
    (v, v_exp)
}

// ---------------------------------------------------------------------------
// Bartlett
// ---------------------------------------------------------------------------

/// Bartlett's test for equal variances across k samples, T ~ χ²(k − 1).
pub fn bartlett(groups: &[&[f64]]) -> Result<TestVerdict, StatsError> {
    let test = TestKind::Bartlett;
    let k = groups.len();
    if k < 2 {
        return Err(StatsError::TooFewGroups {
            required: 2,
            actual: k,
        });
    }
    for g in groups {
        ensure_size(test, MIN_GROUP_SIZE, g.len())?;
    }
    ensure_finite(test, groups)?;

    let variances: Vec<f64> = groups.iter().map(|g| g.iter().variance()).collect();
    if variances.iter().any(|v| !(*v > 0.0)) {
        return Err(StatsError::ZeroVariance { test });
    }

    let n_total: usize = groups.iter().map(|g| g.len()).sum();
    let nk = (n_total - k) as f64;
    let dof: Vec<f64> = groups.iter().map(|g| g.len() as f64 - 1.0).collect();

    let pooled: f64 = dof.iter().zip(&variances).map(|(d, v)| d * v).sum::<f64>() / nk;
    let numerator =
        nk * pooled.ln() - dof.iter().zip(&variances).map(|(d, v)| d * v.ln()).sum::<f64>();
    let reciprocal_sum: f64 = dof.iter().map(|d| 1.0 / d).sum();
    let correction = 1.0 + (reciprocal_sum - 1.0 / nk) / (3.0 * (k as f64 - 1.0));

    let statistic = numerator / correction;
    let p_value = chi_squared_sf(statistic, (k - 1) as f64)?;
    Ok(TestVerdict::new(test, statistic, p_value))
}

// ---------------------------------------------------------------------------
// Student's t
// ---------------------------------------------------------------------------

/// Independent two-sample t-test assuming equal variances.
pub fn student_t(a: &[f64], b: &[f64]) -> Result<TestVerdict, StatsError> {
    let test = TestKind::StudentT;
    ensure_size(test, MIN_GROUP_SIZE, a.len())?;
    ensure_size(test, MIN_GROUP_SIZE, b.len())?;
    ensure_finite(test, &[a, b])?;

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let df = n1 + n2 - 2.0;
    let pooled = ((n1 - 1.0) * a.iter().variance() + (n2 - 1.0) * b.iter().variance()) / df;
    if !(pooled > 0.0) {
        return Err(StatsError::ZeroVariance { test });
    }

    let t = (a.iter().mean() - b.iter().mean()) / (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).map_err(distribution_error)?;
    let p_value = 2.0 * dist.sf(t.abs());
    Ok(TestVerdict::new(test, t, p_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTROL: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];
    const TREATMENT: [f64; 5] = [10.0, 11.0, 9.0, 12.0, 13.0];

    #[test]
    fn test_mann_whitney_separated_groups_exact() {
        let v = mann_whitney_u(&CONTROL, &TREATMENT).unwrap();
        assert_eq!(v.statistic, 0.0);
        assert!((v.p_value - 2.0 / 252.0).abs() < 1e-12);
        assert!(v.reject_null);
    }

    #[test]
    fn test_mann_whitney_identical_with_ties() {
        let v = mann_whitney_u(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(v.p_value, 1.0);
        assert!(!v.reject_null);
    }

    #[test]
    fn test_mann_whitney_normal_approximation() {
        // n > 8 takes the asymptotic branch: z = (81 - 40.5 - 0.5) / sqrt(128.25)
        let a: Vec<f64> = (1..=9).map(f64::from).collect();
        let b: Vec<f64> = (10..=18).map(f64::from).collect();
        let v = mann_whitney_u(&a, &b).unwrap();
        assert_eq!(v.statistic, 0.0);
        let z = 40.0 / 128.25f64.sqrt();
        let expected = 2.0 * Normal::new(0.0, 1.0).unwrap().sf(z);
        assert!((v.p_value - expected).abs() < 1e-12);
        assert!((v.p_value - 4.1229e-4).abs() < 1e-7);
        assert!(v.reject_null);
    }

    #[test]
    fn test_mann_whitney_constant_data() {
        assert_eq!(
            mann_whitney_u(&[2.0, 2.0], &[2.0, 2.0]),
            Err(StatsError::ZeroVariance {
                test: TestKind::MannWhitneyU
            })
        );
    }

    #[test]
    fn test_mann_whitney_insufficient_data() {
        let err = mann_whitney_u(&[1.0], &CONTROL).unwrap_err();
        assert_eq!(
            err,
            StatsError::InsufficientData {
                test: TestKind::MannWhitneyU,
                required: 2,
                actual: 1
            }
        );
        assert!(err.to_string().starts_with("insufficient data for test Mann-Whitney U"));
    }

    #[test]
    fn test_mann_whitney_counts_sum_to_binomial() {
        let counts = mann_whitney_counts(5, 5);
        assert_eq!(counts.len(), 26);
        assert_eq!(counts.iter().sum::<f64>(), 252.0);
        assert_eq!(counts[0], 1.0);
        assert_eq!(counts[25], 1.0);
    }

    #[test]
    fn test_wilcoxon_all_negative_differences() {
        let x = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0];
        let y = [11.0, 22.0, 33.0, 44.0, 55.0, 66.0, 77.0, 88.0];
        let v = wilcoxon_signed_rank(&x, &y).unwrap();
        assert_eq!(v.statistic, 0.0);
        assert!((v.p_value - 2.0 / 256.0).abs() < 1e-12);
        assert!(v.reject_null);
    }

    #[test]
    fn test_wilcoxon_ties_and_zero_use_corrected_variance() {
        // differences 1, -1, 2, 2, 3, 0, 4, 5: the zero is dropped, leaving n = 7
        // with two tied pairs, so var = 7*8*15/24 - (6 + 6)/48 = 34.75
        let x = [11.0, 9.0, 12.0, 12.0, 13.0, 10.0, 14.0, 15.0];
        let y = [10.0; 8];
        let v = wilcoxon_signed_rank(&x, &y).unwrap();
        assert_eq!(v.statistic, 1.5);
        let z = (1.5 - 14.0) / 34.75f64.sqrt();
        let expected = 2.0 * Normal::new(0.0, 1.0).unwrap().sf(z.abs());
        assert!((v.p_value - expected).abs() < 1e-12);
        assert!((v.p_value - 0.033966).abs() < 1e-5);
        assert!(v.reject_null);
    }

    #[test]
    fn test_wilcoxon_rejects_unpaired_lengths() {
        assert!(matches!(
            wilcoxon_signed_rank(&CONTROL, &[1.0, 2.0]),
            Err(StatsError::LengthMismatch {
                left: 5,
                right: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_wilcoxon_all_zero_differences() {
        assert!(matches!(
            wilcoxon_signed_rank(&CONTROL, &CONTROL),
            Err(StatsError::InsufficientData { actual: 0, .. })
        ));
    }

    #[test]
    fn test_signed_rank_counts_total() {
        let counts = signed_rank_counts(4);
        assert_eq!(counts.len(), 11);
        assert_eq!(counts.iter().sum::<f64>(), 16.0);
    }

    #[test]
    fn test_kruskal_wallis_three_separated_groups() {
        let g3 = [11.0, 12.0, 13.0, 14.0, 15.0];
        let g2 = [6.0, 7.0, 8.0, 9.0, 10.0];
        let v = kruskal_wallis(&[&CONTROL, &g2, &g3]).unwrap();
        assert!((v.statistic - 12.5).abs() < 1e-9);
        assert!((v.p_value - (-6.25f64).exp()).abs() < 1e-6);
        assert!(v.reject_null);
    }

    #[test]
    fn test_kruskal_wallis_needs_two_groups() {
        assert!(matches!(
            kruskal_wallis(&[&CONTROL]),
            Err(StatsError::TooFewGroups { actual: 1, .. })
        ));
    }

    #[test]
    fn test_ks_normal_accepts_symmetric_sample() {
        let sample = [-1.5, -1.0, -0.5, -0.2, 0.0, 0.2, 0.5, 1.0, 1.5];
        let v = ks_normal(&sample).unwrap();
        assert!(v.statistic > 0.0 && v.statistic < 0.3);
        assert!(!v.reject_null);
    }

    #[test]
    fn test_ks_normal_constant_sample() {
        assert!(matches!(
            ks_normal(&[3.0, 3.0, 3.0]),
            Err(StatsError::ZeroVariance { .. })
        ));
    }

    #[test]
    fn test_kolmogorov_cdf_critical_value() {
        // tabulated 5% critical value for n = 10
        let p = 1.0 - kolmogorov_cdf(10, 0.40925);
        assert!((p - 0.05).abs() < 2e-3, "p = {p}");
        assert_eq!(kolmogorov_cdf(10, 0.0), 0.0);
        assert_eq!(kolmogorov_cdf(10, 1.0), 1.0);
    }

    #[test]
    fn test_bartlett_detects_unequal_variances() {
        let g1 = [2.0, 3.0, 4.0, 5.0, 6.0];
        let g2 = [10.0, 20.0, 30.0, 40.0, 50.0];
        let v = bartlett(&[&g1, &g2]).unwrap();
        assert!(v.p_value < 0.01);
    }

    #[test]
    fn test_bartlett_equal_variances() {
        let v = bartlett(&[&CONTROL, &TREATMENT]).unwrap();
        assert!(v.statistic.abs() < 1e-9);
        assert!(v.p_value > 0.99);
        assert!(!v.reject_null);
    }

    #[test]
    fn test_bartlett_zero_variance() {
        assert!(matches!(
            bartlett(&[&[1.0, 1.0, 1.0], &CONTROL]),
            Err(StatsError::ZeroVariance { .. })
        ));
    }

    #[test]
    fn test_student_t() {
        let v = student_t(&CONTROL, &TREATMENT).unwrap();
        assert!((v.statistic + 8.0).abs() < 1e-9);
        assert!(v.p_value < 0.001);

        let v = student_t(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!(v.statistic.abs() < 1e-12);
        assert!((v.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_input() {
        assert_eq!(
            student_t(&[1.0, f64::NAN], &CONTROL),
            Err(StatsError::NonFinite {
                test: TestKind::StudentT
            })
        );
    }
}
