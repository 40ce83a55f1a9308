use crate::quadrature::{convert_quadrature_rule_from_1d_f64, QuadraturePair1d};

use darcy_quadrature::univariate;

pub fn gauss(num_points: usize) -> QuadraturePair1d {
    convert_quadrature_rule_from_1d_f64(univariate::gauss(num_points))
}

pub fn iterated_trapezoid(num_subintervals: usize) -> QuadraturePair1d {
    convert_quadrature_rule_from_1d_f64(univariate::iterated_trapezoid(num_subintervals))
}
