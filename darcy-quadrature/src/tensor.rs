//! Quadrature rules for the reference quadrilateral formed by tensor products of 1D rules.

use crate::univariate::{gauss, iterated_trapezoid};
use crate::Rule;

/// Tensor product of two 1D rules. The first rule runs along the first coordinate, and the
/// first coordinate varies fastest.
pub fn quadrilateral_tensor_product(rule_x: &Rule<1>, rule_y: &Rule<1>) -> Rule<2> {
    let (weights_x, points_x) = rule_x;
    let (weights_y, points_y) = rule_y;
    let n = weights_x.len() * weights_y.len();
    let mut weights2d = Vec::with_capacity(n);
    let mut points2d = Vec::with_capacity(n);

    for (&wy, &[y]) in weights_y.iter().zip(points_y) {
        for (&wx, &[x]) in weights_x.iter().zip(points_x) {
            weights2d.push(wx * wy);
            points2d.push([x, y]);
        }
    }

    (weights2d, points2d)
}

/// A Gauss quadrature rule for the reference quadrilateral.
///
/// The rule is constructed as a tensor product from 1D rules, with the provided number of
/// points per dimension.
pub fn quadrilateral_gauss(num_points_per_dim: usize) -> Rule<2> {
    let rule = gauss(num_points_per_dim);
    quadrilateral_tensor_product(&rule, &rule)
}

/// The iterated trapezoidal rule on the reference quadrilateral with the given number of
/// subintervals per dimension.
pub fn quadrilateral_iterated_trapezoid(num_subintervals_per_dim: usize) -> Rule<2> {
    let rule = iterated_trapezoid(num_subintervals_per_dim);
    quadrilateral_tensor_product(&rule, &rule)
}
