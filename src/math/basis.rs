//! Chebyshev-family basis functions.
//!
//! All families are evaluated with the three-term recurrence
//! `P_{k+1}(t) = 2t P_k(t) - P_{k-1}(t)`, which avoids the `acos`/`cos` form
//! and stays exact for the low degrees the identification uses:
//!
//! - `T_k(t)`: `P_0 = 1`, `P_1 = t`
//! - `U_k(t)`: `P_0 = 1`, `P_1 = 2t`
//!
//! Shifted variants substitute `t = 2x - 1` so that `x ∈ [0, 1]`.

use crate::domain::PolyFamily;

/// Evaluate the basis function of the given family and degree at `x`.
pub fn evaluate(family: PolyFamily, degree: usize, x: f64) -> f64 {
    match family {
        PolyFamily::ShiftedChebyshev => chebyshev_t(degree, 2.0 * x - 1.0),
        PolyFamily::Chebyshev => chebyshev_t(degree, x),
        PolyFamily::ShiftedChebyshevSecond => {
            chebyshev_u(degree, 2.0 * x - 1.0) / 2f64.powi(degree as i32)
        }
    }
}

/// Chebyshev polynomial of the first kind.
pub fn chebyshev_t(degree: usize, t: f64) -> f64 {
    recurrence(degree, t, t)
}

/// Chebyshev polynomial of the second kind.
pub fn chebyshev_u(degree: usize, t: f64) -> f64 {
    recurrence(degree, t, 2.0 * t)
}

fn recurrence(degree: usize, t: f64, first: f64) -> f64 {
    if degree == 0 {
        return 1.0;
    }
    let mut prev = 1.0;
    let mut curr = first;
    for _ in 1..degree {
        let next = 2.0 * t * curr - prev;
        prev = curr;
        curr = next;
    }
    curr
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn shifted_first_kind_matches_closed_forms() {
        for &x in &[0.0, 0.1, 0.25, 0.5, 0.9, 1.0] {
            let f = PolyFamily::ShiftedChebyshev;
            assert_abs_diff_eq!(evaluate(f, 0, x), 1.0);
            assert_abs_diff_eq!(evaluate(f, 1, x), 2.0 * x - 1.0, epsilon = 1e-15);
            assert_abs_diff_eq!(evaluate(f, 2, x), 8.0 * x * x - 8.0 * x + 1.0, epsilon = 1e-14);
            assert_abs_diff_eq!(
                evaluate(f, 3, x),
                32.0 * x.powi(3) - 48.0 * x * x + 18.0 * x - 1.0,
                epsilon = 1e-13
            );
        }
    }

    #[test]
    fn plain_first_kind_satisfies_cosine_identity() {
        for &theta in &[0.0, 0.3, 1.1, 2.5] {
            let x = f64::cos(theta);
            for k in 0..8 {
                assert_abs_diff_eq!(
                    evaluate(PolyFamily::Chebyshev, k, x),
                    (k as f64 * theta).cos(),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn scaled_second_kind_is_divided_by_power_of_two() {
        let f = PolyFamily::ShiftedChebyshevSecond;
        for &x in &[0.0, 0.3, 0.5, 1.0] {
            let t = 2.0 * x - 1.0;
            assert_abs_diff_eq!(evaluate(f, 0, x), 1.0);
            assert_abs_diff_eq!(evaluate(f, 1, x), (2.0 * t) / 2.0, epsilon = 1e-15);
            assert_abs_diff_eq!(evaluate(f, 2, x), (4.0 * t * t - 1.0) / 4.0, epsilon = 1e-15);
        }
        // U_k(1) = k + 1
        assert_abs_diff_eq!(evaluate(f, 5, 1.0), 6.0 / 32.0, epsilon = 1e-15);
    }

    #[test]
    fn evaluation_is_bit_identical_across_calls() {
        for family in PolyFamily::ALL {
            for k in 0..10 {
                for i in 0..=20 {
                    let x = i as f64 / 20.0;
                    assert_eq!(
                        evaluate(family, k, x).to_bits(),
                        evaluate(family, k, x).to_bits()
                    );
                }
            }
        }
    }
}
