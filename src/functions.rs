//! Pointwise coefficient and reference fields of the Darcy problem.
//!
//! The manufactured solution is `u = (0, c (1 - y^2))`, `p = -rho (y - y^3 / 3)` with
//! `c = lambda * k * rho`, which satisfies `u = -lambda K grad p` for `K = k I` and
//! `div u = -2 c y`.
use crate::{DarcyError, Result};
use nalgebra::{Matrix2, Point2, Vector3};

/// A field that can be evaluated at points of the physical domain.
pub trait PointwiseField {
    type Value: Clone;

    fn value(&self, x: &Point2<f64>) -> Self::Value;

    /// Evaluates the field at every point, writing into `values`.
    ///
    /// # Errors
    ///
    /// Returns an assembly error if `points` and `values` have different lengths.
    fn value_list(&self, points: &[Point2<f64>], values: &mut [Self::Value]) -> Result<()> {
        if points.len() != values.len() {
            return Err(DarcyError::Assembly(format!(
                "cannot evaluate field at {} points into {} values",
                points.len(),
                values.len()
            )));
        }
        for (x, value) in points.iter().zip(values) {
            *value = self.value(x);
        }
        Ok(())
    }
}

impl<F: PointwiseField> PointwiseField for &F {
    type Value = F::Value;

    fn value(&self, x: &Point2<f64>) -> Self::Value {
        (**self).value(x)
    }
}

/// Adapter turning a closure into a [`PointwiseField`].
#[derive(Debug, Clone, Copy)]
pub struct FnField<F>(pub F);

impl<F, V> PointwiseField for FnField<F>
where
    F: Fn(&Point2<f64>) -> V,
    V: Clone,
{
    type Value = V;

    fn value(&self, x: &Point2<f64>) -> V {
        (self.0)(x)
    }
}

/// Source term `f = 2 c y` of the mass balance `-div u = f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RightHandSide {
    pub flux_scale: f64,
}

impl PointwiseField for RightHandSide {
    type Value = f64;

    fn value(&self, x: &Point2<f64>) -> f64 {
        2.0 * self.flux_scale * x.y
    }
}

/// Dirichlet pressure trace imposed weakly on the top boundary, `p(y = 1) = -2 rho / 3`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureBoundaryValue {
    pub density: f64,
}

impl PointwiseField for PressureBoundaryValue {
    type Value = f64;

    fn value(&self, _x: &Point2<f64>) -> f64 {
        -2.0 * self.density / 3.0
    }
}

/// Isotropic permeability tensor `K = k I`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PermeabilityTensor {
    pub permeability: f64,
}

impl PermeabilityTensor {
    pub fn isotropic(permeability: f64) -> Self {
        Self { permeability }
    }

    /// The inverse tensor field.
    ///
    /// # Errors
    ///
    /// Returns a configuration error unless the permeability is positive and finite.
    pub fn try_inverse(&self) -> Result<PermeabilityInverseTensor> {
        if self.permeability > 0.0 && self.permeability.is_finite() {
            Ok(PermeabilityInverseTensor {
                inverse_permeability: 1.0 / self.permeability,
            })
        } else {
            Err(DarcyError::Configuration(format!(
                "permeability must be positive and finite, got {}",
                self.permeability
            )))
        }
    }
}

impl PointwiseField for PermeabilityTensor {
    type Value = Matrix2<f64>;

    fn value(&self, _x: &Point2<f64>) -> Matrix2<f64> {
        Matrix2::identity() * self.permeability
    }
}

/// Inverse permeability `K^{-1}`, the coefficient of the velocity mass term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PermeabilityInverseTensor {
    inverse_permeability: f64,
}

impl PointwiseField for PermeabilityInverseTensor {
    type Value = Matrix2<f64>;

    fn value(&self, _x: &Point2<f64>) -> Matrix2<f64> {
        Matrix2::identity() * self.inverse_permeability
    }
}

/// The analytic solution `[u_x, u_y, p]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyticSolution {
    pub density: f64,
    pub flux_scale: f64,
}

impl PointwiseField for AnalyticSolution {
    type Value = Vector3<f64>;

    fn value(&self, x: &Point2<f64>) -> Vector3<f64> {
        let y = x.y;
        Vector3::new(
            0.0,
            self.flux_scale * (1.0 - y * y),
            -self.density * (y - y * y * y / 3.0),
        )
    }
}
