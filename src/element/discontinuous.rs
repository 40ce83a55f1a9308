use crate::element::LagrangeBasis1d;
use nalgebra::Point2;

/// Discontinuous tensor-product Lagrange space `DGQ_k` on the reference quadrilateral,
/// with nodes at the Gauss points.
///
/// Shape function `i * (k + 1) + j` is `G_j(xi) G_i(eta)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscontinuousQuad {
    degree: usize,
    basis: LagrangeBasis1d,
}

impl DiscontinuousQuad {
    pub fn new(degree: usize) -> Self {
        Self {
            degree,
            basis: LagrangeBasis1d::gauss(degree + 1),
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn num_dofs(&self) -> usize {
        (self.degree + 1) * (self.degree + 1)
    }

    pub fn populate_values(&self, xi: &Point2<f64>, values: &mut [f64]) {
        assert_eq!(values.len(), self.num_dofs());
        let n = self.degree + 1;
        let mut values_x = vec![0.0; n];
        let mut values_y = vec![0.0; n];
        self.basis.populate_values(xi.x, &mut values_x);
        self.basis.populate_values(xi.y, &mut values_y);
        for (i, &gy) in values_y.iter().enumerate() {
            for (j, &gx) in values_x.iter().enumerate() {
                values[i * n + j] = gx * gy;
            }
        }
    }
}
