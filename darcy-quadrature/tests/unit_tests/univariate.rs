use darcy_quadrature::univariate::{gauss, iterated, iterated_trapezoid, trapezoid, try_gauss};
use darcy_quadrature::{integrate, Error};

use matrixcompare::assert_scalar_eq;
use proptest::prelude::*;

fn monomial_integral(alpha: i32) -> f64 {
    (1.0 - (-1.0f64).powi(alpha + 1)) / (alpha as f64 + 1.0)
}

#[test]
fn gauss_rules_satisfy_expected_accuracy() {
    for n in 1..=60 {
        let expected_polynomial_degree = 2 * n - 1;
        let rule = gauss(n);

        assert!(rule.0.iter().all(|&w| w > 0.0));

        for alpha in 0..=expected_polynomial_degree as i32 {
            let estimated_integral = integrate(&rule, |x| x[0].powi(alpha));
            assert_scalar_eq!(estimated_integral, monomial_integral(alpha), comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn gauss_points_are_ascending_and_symmetric() {
    for n in 1..=12 {
        let (_, points) = gauss(n);
        for i in 0..n {
            assert_eq!(points[i][0], -points[n - 1 - i][0]);
            if i + 1 < n {
                assert!(points[i][0] < points[i + 1][0]);
            }
        }
    }
}

#[test]
fn try_gauss_rejects_empty_rule() {
    assert_eq!(try_gauss(0), Err(Error::NoRuleAvailable));
}

#[test]
fn iterated_trapezoid_merges_shared_endpoints() {
    let (weights, points) = iterated_trapezoid(4);
    assert_eq!(points.len(), 5);
    assert_eq!(points.first(), Some(&[-1.0]));
    assert_eq!(points.last(), Some(&[1.0]));
    assert_eq!(weights, vec![0.25, 0.5, 0.5, 0.5, 0.25]);
}

#[test]
fn iterated_gauss_keeps_all_points() {
    let rule = iterated(&gauss(2), 3);
    assert_eq!(rule.0.len(), 6);
    // Each subinterval is integrated exactly up to degree 3
    for alpha in 0..=3 {
        assert_scalar_eq!(integrate(&rule, |x| x[0].powi(alpha)), monomial_integral(alpha), comp = abs, tol = 1e-14);
    }
}

#[test]
fn trapezoid_integrates_linear_functions_exactly() {
    let rule = trapezoid();
    assert_scalar_eq!(integrate(&rule, |x| 3.0 * x[0] + 2.0), 4.0, comp = abs, tol = 1e-15);
}

proptest! {
    #[test]
    fn iterated_trapezoid_converges_quadratically(n in 1usize..64) {
        // Error of the composite trapezoidal rule for x^2 on [-1, 1] is exactly 2 h^2 / 6
        let h = 2.0 / n as f64;
        let estimate = integrate(&iterated_trapezoid(n), |x| x[0] * x[0]);
        let expected = 2.0 / 3.0 + h * h / 3.0;
        prop_assert!((estimate - expected).abs() <= 1e-12);
    }
}
