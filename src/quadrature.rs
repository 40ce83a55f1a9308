//! Quadrature rules expressed with `nalgebra` points.
//!
//! The rules themselves are provided by the `darcy-quadrature` crate, this module converts
//! them into weight/point pairs that the assembly routines consume.
use nalgebra::{OPoint, Point1, Point2, U1, U2};

/// Errors returned by quadrature methods.
pub use darcy_quadrature::Error as QuadratureError;

pub mod tensor;
pub mod univariate;

pub type QuadraturePair<D> = (Vec<f64>, Vec<OPoint<f64, D>>);
pub type QuadraturePair1d = QuadraturePair<U1>;
pub type QuadraturePair2d = QuadraturePair<U2>;

/// A quadrature rule consisting of weights and points.
pub trait Quadrature<P> {
    fn weights(&self) -> &[f64];
    fn points(&self) -> &[P];

    fn num_points(&self) -> usize {
        self.weights().len()
    }

    /// Approximates the integral of the given function using this quadrature rule.
    fn integrate(&self, f: impl Fn(&P) -> f64) -> f64 {
        self.weights()
            .iter()
            .zip(self.points())
            .map(|(w, p)| w * f(p))
            .sum()
    }
}

impl<P> Quadrature<P> for (Vec<f64>, Vec<P>) {
    fn weights(&self) -> &[f64] {
        &self.0
    }

    fn points(&self) -> &[P] {
        &self.1
    }
}

pub fn convert_quadrature_rule_from_1d_f64(rule: darcy_quadrature::Rule1d) -> QuadraturePair1d {
    let (weights, points) = rule;
    let points = points.into_iter().map(|[x]| Point1::new(x)).collect();
    (weights, points)
}

pub fn convert_quadrature_rule_from_2d_f64(rule: darcy_quadrature::Rule2d) -> QuadraturePair2d {
    let (weights, points) = rule;
    let points = points.into_iter().map(|[x, y]| Point2::new(x, y)).collect();
    (weights, points)
}
