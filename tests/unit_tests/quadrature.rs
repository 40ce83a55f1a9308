use darcy::quadrature::tensor::{quadrilateral_gauss, quadrilateral_iterated_trapezoid};
use darcy::quadrature::univariate::{gauss, iterated_trapezoid};
use darcy::quadrature::Quadrature;
use matrixcompare::{assert_scalar_eq, prop_assert_scalar_eq};
use proptest::prelude::*;

fn monomial_integral_1d(degree: i32) -> f64 {
    if degree % 2 == 0 {
        2.0 / (degree as f64 + 1.0)
    } else {
        0.0
    }
}

#[test]
fn trapezoid_rules_integrate_bilinear_functions_exactly() {
    for n in 1..=5 {
        let rule = iterated_trapezoid(n);
        assert_eq!(rule.num_points(), n + 1);
        assert_scalar_eq!(rule.integrate(|x| 3.0 * x.x + 1.0), 2.0, comp = abs, tol = 1e-14);

        let rule = quadrilateral_iterated_trapezoid(n);
        assert_eq!(rule.num_points(), (n + 1) * (n + 1));
        let integral = rule.integrate(|p| 1.0 + p.x + 2.0 * p.y + p.x * p.y);
        assert_scalar_eq!(integral, 4.0, comp = abs, tol = 1e-14);
    }
}

#[test]
fn trapezoid_rule_converges_quadratically_for_smooth_functions() {
    let error = |n: usize| (iterated_trapezoid(n).integrate(|x| x.x * x.x) - 2.0 / 3.0).abs();
    let rate = (error(8) / error(16)).log2();
    assert_scalar_eq!(rate, 2.0, comp = abs, tol = 1e-6);
}

proptest! {
    #[test]
    fn gauss_rules_integrate_monomials_exactly(
        (n, a, b) in (1..8usize).prop_flat_map(|n| (Just(n), 0..2 * n as i32, 0..2 * n as i32))
    ) {
        let rule = gauss(n);
        prop_assert_scalar_eq!(
            rule.integrate(|x| x.x.powi(a)),
            monomial_integral_1d(a),
            comp = abs,
            tol = 1e-13
        );

        let rule = quadrilateral_gauss(n);
        prop_assert_eq!(rule.num_points(), n * n);
        prop_assert_scalar_eq!(
            rule.integrate(|p| p.x.powi(a) * p.y.powi(b)),
            monomial_integral_1d(a) * monomial_integral_1d(b),
            comp = abs,
            tol = 1e-13
        );
    }
}
