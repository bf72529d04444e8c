use super::{StatsError, TestKind};

/// Pick the group-difference test from the shape of the comparison alone.
///
/// | groups | paired | test               |
/// |--------|--------|--------------------|
/// | > 2    | any    | Kruskal-Wallis     |
/// | 2      | yes    | Wilcoxon signed-rank |
/// | 2      | no     | Mann-Whitney U     |
pub fn select_test(k: usize, paired: bool) -> Result<TestKind, StatsError> {
    match k {
        0 | 1 => Err(StatsError::TooFewGroups {
            required: 2,
            actual: k,
        }),
        2 if paired => Ok(TestKind::WilcoxonSignedRank),
        2 => Ok(TestKind::MannWhitneyU),
        _ => Ok(TestKind::KruskalWallis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_many_groups_use_kruskal_wallis() {
        assert_eq!(select_test(3, false), Ok(TestKind::KruskalWallis));
        assert_eq!(select_test(3, true), Ok(TestKind::KruskalWallis));
        assert_eq!(select_test(7, false), Ok(TestKind::KruskalWallis));
    }

    #[test]
    fn test_two_groups_depend_on_pairing() {
        assert_eq!(select_test(2, true), Ok(TestKind::WilcoxonSignedRank));
        assert_eq!(select_test(2, false), Ok(TestKind::MannWhitneyU));
    }

    #[test]
    fn test_single_group_is_an_error() {
        assert_eq!(
            select_test(1, false),
            Err(StatsError::TooFewGroups {
                required: 2,
                actual: 1
            })
        );
        assert!(select_test(0, true).is_err());
    }
}
