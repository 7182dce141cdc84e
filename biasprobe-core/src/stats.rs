//! Statistical primitives for the comparison engine.
//!
//! Classical hypothesis tests over small samples: Welch's unequal-variance
//! t-test, one-way ANOVA, and standardized effect sizes. p-values come
//! from the regularized incomplete beta function evaluated with Lentz's
//! continued fraction, which covers both the Student-t and F
//! distributions.

/// Result of a two-sample mean-difference test.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoSampleTest {
    pub statistic: f64,
    pub df: f64,
    pub p_value: f64,
}

/// Result of a one-way omnibus variance test.
#[derive(Debug, Clone, PartialEq)]
pub struct AnovaTest {
    pub statistic: f64,
    pub df_between: f64,
    pub df_within: f64,
    pub p_value: f64,
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance (n - 1 denominator); 0 when fewer than two
/// observations.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Welch's unequal-variance t-test, two-sided.
///
/// Returns `None` when either sample has fewer than two observations.
/// Both samples having zero variance is not an error: equal means give
/// p = 1, unequal means give an infinite statistic with p = 0.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<TwoSampleTest> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }
    let (m1, m2) = (mean(a), mean(b));
    let (v1, v2) = (sample_variance(a), sample_variance(b));
    let (n1, n2) = (a.len() as f64, b.len() as f64);

    let se_sq = v1 / n1 + v2 / n2;
    if se_sq == 0.0 {
        // Both groups are constant.
        return Some(if m1 == m2 {
            TwoSampleTest {
                statistic: 0.0,
                df: n1 + n2 - 2.0,
                p_value: 1.0,
            }
        } else {
            TwoSampleTest {
                statistic: if m1 > m2 {
                    f64::INFINITY
                } else {
                    f64::NEG_INFINITY
                },
                df: n1 + n2 - 2.0,
                p_value: 0.0,
            }
        });
    }

    let statistic = (m1 - m2) / se_sq.sqrt();
    // Welch-Satterthwaite degrees of freedom.
    let df = se_sq.powi(2)
        / ((v1 / n1).powi(2) / (n1 - 1.0) + (v2 / n2).powi(2) / (n2 - 1.0));
    let p_value = student_t_two_sided_p(statistic, df);

    Some(TwoSampleTest {
        statistic,
        df,
        p_value,
    })
}

/// One-way ANOVA omnibus F-test across `groups`.
///
/// Returns `None` with fewer than two groups or when any group has fewer
/// than two observations. Zero within-group variance degenerates the same
/// way as the t-test: identical group means give p = 1, differing means
/// give an infinite statistic with p = 0.
pub fn one_way_anova(groups: &[&[f64]]) -> Option<AnovaTest> {
    if groups.len() < 2 || groups.iter().any(|g| g.len() < 2) {
        return None;
    }
    let n_total: usize = groups.iter().map(|g| g.len()).sum();
    let grand_mean =
        groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n_total as f64;

    let ss_between: f64 = groups
        .iter()
        .map(|g| g.len() as f64 * (mean(g) - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = groups
        .iter()
        .map(|g| {
            let m = mean(g);
            g.iter().map(|v| (v - m).powi(2)).sum::<f64>()
        })
        .sum();

    let df_between = (groups.len() - 1) as f64;
    let df_within = (n_total - groups.len()) as f64;

    if ss_within == 0.0 {
        return Some(if ss_between == 0.0 {
            AnovaTest {
                statistic: 0.0,
                df_between,
                df_within,
                p_value: 1.0,
            }
        } else {
            AnovaTest {
                statistic: f64::INFINITY,
                df_between,
                df_within,
                p_value: 0.0,
            }
        });
    }

    let statistic = (ss_between / df_between) / (ss_within / df_within);
    let p_value = f_upper_tail_p(statistic, df_between, df_within);

    Some(AnovaTest {
        statistic,
        df_between,
        df_within,
        p_value,
    })
}

/// Cohen's d with a pooled standard deviation. When both samples are
/// constant, equal means give 0 and unequal means give a signed infinity.
pub fn cohens_d(a: &[f64], b: &[f64]) -> f64 {
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let pooled_var = ((n1 - 1.0) * sample_variance(a) + (n2 - 1.0) * sample_variance(b))
        / (n1 + n2 - 2.0);
    let diff = mean(a) - mean(b);
    if pooled_var == 0.0 {
        return if diff == 0.0 {
            0.0
        } else if diff > 0.0 {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
    }
    diff / pooled_var.sqrt()
}

/// Eta squared: between-group share of total variance; 0 when the data is
/// entirely constant.
pub fn eta_squared(groups: &[&[f64]]) -> f64 {
    let n_total: usize = groups.iter().map(|g| g.len()).sum();
    if n_total == 0 {
        return 0.0;
    }
    let grand_mean =
        groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n_total as f64;
    let ss_between: f64 = groups
        .iter()
        .map(|g| g.len() as f64 * (mean(g) - grand_mean).powi(2))
        .sum();
    let ss_total: f64 = groups
        .iter()
        .flat_map(|g| g.iter())
        .map(|v| (v - grand_mean).powi(2))
        .sum();
    if ss_total == 0.0 {
        return 0.0;
    }
    ss_between / ss_total
}

/// Two-sided p-value for a Student-t statistic with `df` degrees of
/// freedom.
fn student_t_two_sided_p(t: f64, df: f64) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    regularized_incomplete_beta(df / 2.0, 0.5, df / (df + t * t))
}

/// Upper-tail p-value for an F statistic.
fn f_upper_tail_p(f: f64, df1: f64, df2: f64) -> f64 {
    if !f.is_finite() {
        return 0.0;
    }
    if f <= 0.0 {
        return 1.0;
    }
    regularized_incomplete_beta(df2 / 2.0, df1 / 2.0, df2 / (df2 + df1 * f))
}

/// Lanczos approximation of ln(Gamma(x)) for x > 0.
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 6] = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];
    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut series = 1.000000000190015;
    for c in COEFFS {
        y += 1.0;
        series += c / y;
    }
    -tmp + (2.5066282746310005 * series / x).ln()
}

/// Regularized incomplete beta function I_x(a, b), evaluated through the
/// continued-fraction form with the symmetry transformation for
/// convergence.
fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b)
        + a * x.ln()
        + b * (1.0 - x).ln();
    let front = ln_front.exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Lentz's method for the incomplete beta continued fraction.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 200;
    const EPS: f64 = 3.0e-14;
    const TINY: f64 = 1.0e-30;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_mean_and_variance() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0, 6.0]), 4.0);
        assert_eq!(sample_variance(&[5.0]), 0.0);
        assert!(close(sample_variance(&[1.0, 2.0, 3.0, 4.0, 5.0]), 2.5, 1e-12));
    }

    #[test]
    fn test_ln_gamma_known_values() {
        assert!(close(ln_gamma(1.0), 0.0, 1e-10));
        assert!(close(ln_gamma(5.0), 24.0f64.ln(), 1e-10));
        assert!(close(ln_gamma(0.5), std::f64::consts::PI.sqrt().ln(), 1e-10));
    }

    #[test]
    fn test_incomplete_beta_endpoints() {
        assert_eq!(regularized_incomplete_beta(2.0, 3.0, 0.0), 0.0);
        assert_eq!(regularized_incomplete_beta(2.0, 3.0, 1.0), 1.0);
        // I_x(1, 1) is the identity.
        assert!(close(regularized_incomplete_beta(1.0, 1.0, 0.37), 0.37, 1e-10));
        // I_x(3, 1) = x^3.
        assert!(close(
            regularized_incomplete_beta(3.0, 1.0, 0.5),
            0.125,
            1e-10
        ));
    }

    #[test]
    fn test_welch_known_value() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [2.0, 3.0, 4.0, 5.0, 6.0];
        let test = welch_t_test(&a, &b).unwrap();
        assert!(close(test.statistic, -1.0, 1e-10));
        assert!(close(test.df, 8.0, 1e-10));
        assert!(close(test.p_value, 0.3466, 1e-3));
    }

    #[test]
    fn test_welch_symmetry() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [4.0, 5.0, 7.0, 9.0, 11.0];
        let ab = welch_t_test(&a, &b).unwrap();
        let ba = welch_t_test(&b, &a).unwrap();
        assert!(close(ab.statistic.abs(), ba.statistic.abs(), 1e-12));
        assert!(close(ab.p_value, ba.p_value, 1e-12));
        assert!(close(ab.df, ba.df, 1e-12));
    }

    #[test]
    fn test_welch_insufficient_samples() {
        assert!(welch_t_test(&[1.0], &[1.0, 2.0]).is_none());
        assert!(welch_t_test(&[], &[]).is_none());
    }

    #[test]
    fn test_welch_zero_variance_equal_means() {
        let test = welch_t_test(&[3.0, 3.0, 3.0], &[3.0, 3.0]).unwrap();
        assert_eq!(test.statistic, 0.0);
        assert_eq!(test.p_value, 1.0);
    }

    #[test]
    fn test_welch_zero_variance_unequal_means() {
        let test = welch_t_test(&[1.0, 1.0], &[9.0, 9.0]).unwrap();
        assert!(test.statistic.is_infinite());
        assert_eq!(test.p_value, 0.0);
    }

    #[test]
    fn test_anova_known_value() {
        let g1 = [1.0, 2.0, 3.0];
        let g2 = [2.0, 3.0, 4.0];
        let g3 = [3.0, 4.0, 5.0];
        let test = one_way_anova(&[&g1, &g2, &g3]).unwrap();
        assert!(close(test.statistic, 3.0, 1e-10));
        assert_eq!(test.df_between, 2.0);
        assert_eq!(test.df_within, 6.0);
        // F(2, 6) upper tail at 3.0 is exactly 0.125.
        assert!(close(test.p_value, 0.125, 1e-10));
    }

    #[test]
    fn test_anova_requires_two_groups() {
        let g = [1.0, 2.0];
        assert!(one_way_anova(&[&g]).is_none());
        assert!(one_way_anova(&[&g, &[5.0]]).is_none());
    }

    #[test]
    fn test_anova_zero_within_variance() {
        let equal = one_way_anova(&[&[2.0, 2.0], &[2.0, 2.0]]).unwrap();
        assert_eq!(equal.p_value, 1.0);
        let unequal = one_way_anova(&[&[1.0, 1.0], &[5.0, 5.0]]).unwrap();
        assert!(unequal.statistic.is_infinite());
        assert_eq!(unequal.p_value, 0.0);
    }

    #[test]
    fn test_cohens_d() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [2.0, 3.0, 4.0, 5.0, 6.0];
        assert!(close(cohens_d(&a, &b), -1.0 / 2.5f64.sqrt(), 1e-10));
        assert_eq!(cohens_d(&[3.0, 3.0], &[3.0, 3.0]), 0.0);
        assert!(cohens_d(&[9.0, 9.0], &[1.0, 1.0]).is_infinite());
    }

    #[test]
    fn test_eta_squared() {
        let g1 = [1.0, 2.0, 3.0];
        let g2 = [2.0, 3.0, 4.0];
        let g3 = [3.0, 4.0, 5.0];
        // ss_between = 6, ss_total = 12.
        assert!(close(eta_squared(&[&g1, &g2, &g3]), 0.5, 1e-10));
        assert_eq!(eta_squared(&[&[2.0, 2.0], &[2.0, 2.0]]), 0.0);
    }
}
