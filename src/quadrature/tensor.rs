use crate::quadrature::{convert_quadrature_rule_from_2d_f64, QuadraturePair2d};

use darcy_quadrature::tensor;

pub fn quadrilateral_gauss(num_points_per_dim: usize) -> QuadraturePair2d {
    convert_quadrature_rule_from_2d_f64(tensor::quadrilateral_gauss(num_points_per_dim))
}

/// Iterated trapezoidal rule on the reference quadrilateral, with the given number of
/// subintervals per dimension.
pub fn quadrilateral_iterated_trapezoid(num_subintervals_per_dim: usize) -> QuadraturePair2d {
    convert_quadrature_rule_from_2d_f64(tensor::quadrilateral_iterated_trapezoid(num_subintervals_per_dim))
}
