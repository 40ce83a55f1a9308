use crate::element::LagrangeBasis1d;
use nalgebra::{Point2, Vector2};

/// Describes a single Raviart-Thomas shape function as a tensor product of 1D Lagrange
/// polynomials.
///
/// A shape function with `component == 0` is `(N_a(xi) G_b(eta), 0)`, one with
/// `component == 1` is `(0, G_b(xi) N_a(eta))`, where `N` interpolates at the end points and
/// interior Gauss points (`k + 2` nodes) and `G` at the `k + 1` Gauss points.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RaviartThomasShape {
    pub component: usize,
    pub normal_node: usize,
    pub tangential_node: usize,
}

/// The Raviart-Thomas space `RT_k` on the reference quadrilateral.
///
/// The first component lies in `Q_{k+1,k}`, the second in `Q_{k,k+1}`. The degrees of
/// freedom are nodal values of the normal component: `k + 1` per face and `2 k (k + 1)` in the
/// interior.
#[derive(Debug, Clone, PartialEq)]
pub struct RaviartThomasQuad {
    degree: usize,
    normal: LagrangeBasis1d,
    tangential: LagrangeBasis1d,
    shapes: Vec<RaviartThomasShape>,
}

impl RaviartThomasQuad {
    pub fn new(degree: usize) -> Self {
        let k = degree;
        let normal = LagrangeBasis1d::gauss_with_endpoints(k);
        let tangential = LagrangeBasis1d::gauss(k + 1);

        let shape = |component, normal_node, tangential_node| RaviartThomasShape {
            component,
            normal_node,
            tangential_node,
        };

        let mut shapes = Vec::with_capacity(2 * (k + 1) * (k + 2));
        // Face dofs, ordered along the counter-clockwise direction of each face. Since the
        // Gauss points are symmetric, reversing the order of the nodes reverses the direction.
        shapes.extend((0..=k).map(|j| shape(1, 0, j)));
        shapes.extend((0..=k).map(|j| shape(0, k + 1, j)));
        shapes.extend((0..=k).map(|j| shape(1, k + 1, k - j)));
        shapes.extend((0..=k).map(|j| shape(0, 0, k - j)));
        // Interior dofs
        for component in 0..2 {
            for a in 1..=k {
                shapes.extend((0..=k).map(|b| shape(component, a, b)));
            }
        }

        Self {
            degree,
            normal,
            tangential,
            shapes,
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn num_dofs(&self) -> usize {
        self.shapes.len()
    }

    pub fn shapes(&self) -> &[RaviartThomasShape] {
        &self.shapes
    }

    /// The Gauss nodes along a face, in the direction of the face.
    pub fn face_nodes(&self) -> &[f64] {
        self.tangential.nodes()
    }

    /// Evaluates the shape functions and their (exact) divergences at `xi`.
    pub fn populate_values(&self, xi: &Point2<f64>, values: &mut [Vector2<f64>], divergences: &mut [f64]) {
        assert_eq!(values.len(), self.num_dofs());
        assert_eq!(divergences.len(), self.num_dofs());

        let nn = self.normal.num_nodes();
        let nt = self.tangential.num_nodes();
        let mut normal_values = vec![0.0; 2 * nn];
        let mut normal_derivatives = vec![0.0; 2 * nn];
        let mut tangential_values = vec![0.0; 2 * nt];
        for d in 0..2 {
            self.normal
                .populate_values(xi[d], &mut normal_values[d * nn..(d + 1) * nn]);
            self.normal
                .populate_derivatives(xi[d], &mut normal_derivatives[d * nn..(d + 1) * nn]);
            self.tangential
                .populate_values(xi[d], &mut tangential_values[d * nt..(d + 1) * nt]);
        }

        for (shape, value, divergence) in itertools::izip!(&self.shapes, values, divergences) {
            let RaviartThomasShape {
                component: c,
                normal_node: a,
                tangential_node: b,
            } = *shape;
            // The normal factor depends on coordinate c, the tangential factor on the other one
            let t = 1 - c;
            let n = normal_values[c * nn + a];
            let dn = normal_derivatives[c * nn + a];
            let g = tangential_values[t * nt + b];
            *value = Vector2::zeros();
            value[c] = n * g;
            *divergence = dn * g;
        }
    }
}
