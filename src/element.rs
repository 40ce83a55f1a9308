//! Reference elements and the mixed Raviart-Thomas/DGQ element.
//!
//! The mixed element pairs a vector-valued, normal-continuous velocity space with a
//! discontinuous pressure space on quadrilaterals. The solution has `dim + 1` components,
//! ordered as `[u_x, u_y, p]`.
use crate::{DarcyError, Result};
use darcy_quadrature::univariate::gauss;
use nalgebra::{Matrix2, Point2, Vector2};
use std::ops::Range;

mod discontinuous;
mod quadrilateral;
mod raviart_thomas;

pub use discontinuous::DiscontinuousQuad;
pub use quadrilateral::{Quad4d2Element, REFERENCE_FACE_OUTWARD_SIGNS};
pub use raviart_thomas::{RaviartThomasQuad, RaviartThomasShape};

/// Geometric map from the reference quadrilateral `[-1, 1]^2` to a physical cell.
pub trait FiniteElement {
    /// Maps reference coordinates to physical coordinates.
    fn map_reference_coords(&self, xi: &Point2<f64>) -> Point2<f64>;

    /// Jacobian of the reference-to-physical map at the given reference coordinates.
    fn reference_jacobian(&self, xi: &Point2<f64>) -> Matrix2<f64>;

    /// Largest distance between two vertices of the element.
    fn diameter(&self) -> f64;
}

/// The field a degree of freedom belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FieldRole {
    Velocity,
    Pressure,
}

/// Selection of solution components, indexed `[u_x, u_y, p]` in two dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentMask(Vec<bool>);

impl ComponentMask {
    pub fn new(selected: Vec<bool>) -> Self {
        Self(selected)
    }

    /// Selects the `dim` velocity components.
    pub fn velocity(dim: usize) -> Self {
        Self((0..=dim).map(|c| c < dim).collect())
    }

    /// Selects the pressure component.
    pub fn pressure(dim: usize) -> Self {
        Self((0..=dim).map(|c| c == dim).collect())
    }

    pub fn complement(&self) -> Self {
        Self(self.0.iter().map(|selected| !selected).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_selected(&self, component: usize) -> bool {
        self.0.get(component).copied().unwrap_or(false)
    }

    /// Whether degrees of freedom with the given role are selected.
    ///
    /// A velocity dof contributes to every velocity component, so it is selected as soon as
    /// any velocity component is.
    pub fn selects_role(&self, role: FieldRole) -> bool {
        let dim = self.0.len().saturating_sub(1);
        match role {
            FieldRole::Velocity => (0..dim).any(|c| self.is_selected(c)),
            FieldRole::Pressure => self.is_selected(dim),
        }
    }
}

/// Lagrange polynomials on `[-1, 1]` interpolating at a set of distinct nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct LagrangeBasis1d {
    nodes: Vec<f64>,
}

impl LagrangeBasis1d {
    pub fn from_nodes(nodes: Vec<f64>) -> Self {
        Self { nodes }
    }

    /// Interpolation at the `num_nodes` Gauss points.
    pub fn gauss(num_nodes: usize) -> Self {
        let (_, points) = gauss(num_nodes);
        Self::from_nodes(points.into_iter().map(|[x]| x).collect())
    }

    /// Interpolation at both end points and the `num_interior` Gauss points in between.
    pub fn gauss_with_endpoints(num_interior: usize) -> Self {
        let mut nodes = vec![-1.0];
        if num_interior > 0 {
            let (_, points) = gauss(num_interior);
            nodes.extend(points.into_iter().map(|[x]| x));
        }
        nodes.push(1.0);
        Self::from_nodes(nodes)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    pub fn value(&self, i: usize, t: f64) -> f64 {
        let x_i = self.nodes[i];
        self.nodes
            .iter()
            .enumerate()
            .filter(|&(m, _)| m != i)
            .map(|(_, &x_m)| (t - x_m) / (x_i - x_m))
            .product()
    }

    pub fn derivative(&self, i: usize, t: f64) -> f64 {
        let x_i = self.nodes[i];
        let mut sum = 0.0;
        for (l, &x_l) in self.nodes.iter().enumerate() {
            if l == i {
                continue;
            }
            let product: f64 = self
                .nodes
                .iter()
                .enumerate()
                .filter(|&(m, _)| m != i && m != l)
                .map(|(_, &x_m)| (t - x_m) / (x_i - x_m))
                .product();
            sum += product / (x_i - x_l);
        }
        sum
    }

    pub fn populate_values(&self, t: f64, values: &mut [f64]) {
        assert_eq!(values.len(), self.num_nodes());
        for (i, value) in values.iter_mut().enumerate() {
            *value = self.value(i, t);
        }
    }

    pub fn populate_derivatives(&self, t: f64, derivatives: &mut [f64]) {
        assert_eq!(derivatives.len(), self.num_nodes());
        for (i, derivative) in derivatives.iter_mut().enumerate() {
            *derivative = self.derivative(i, t);
        }
    }
}

/// Raviart-Thomas velocity of degree `k` paired with discontinuous pressure of degree `k` on
/// quadrilaterals.
///
/// Local dofs are ordered as
///
/// 1. `4 (k + 1)` face dofs, face by face, where face `f` runs from vertex `f` to vertex
///    `f + 1` and its dofs are ordered along that direction,
/// 2. `2 k (k + 1)` interior velocity dofs,
/// 3. `(k + 1)^2` pressure dofs.
#[derive(Debug, Clone, PartialEq)]
pub struct MixedElement {
    dim: usize,
    velocity: RaviartThomasQuad,
    pressure: DiscontinuousQuad,
}

impl MixedElement {
    /// The two-dimensional mixed element of the given degree.
    pub fn new(degree: usize) -> Self {
        Self {
            dim: 2,
            velocity: RaviartThomasQuad::new(degree),
            pressure: DiscontinuousQuad::new(degree),
        }
    }

    /// Constructs the element for the given spatial dimension.
    ///
    /// Only quadrilaterals in two dimensions are supported, any other dimension is a
    /// configuration error.
    pub fn try_new(degree: usize, dim: usize) -> Result<Self> {
        if dim != 2 {
            return Err(DarcyError::Configuration(format!(
                "the Raviart-Thomas/DGQ element is only available in two dimensions, not {}",
                dim
            )));
        }
        Ok(Self::new(degree))
    }

    pub fn degree(&self) -> usize {
        self.velocity.degree()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of solution components, `dim` velocity components and one pressure component.
    pub fn n_components(&self) -> usize {
        self.dim + 1
    }

    pub fn vertices_per_cell(&self) -> usize {
        4
    }

    pub fn faces_per_cell(&self) -> usize {
        4
    }

    pub fn dofs_per_face(&self) -> usize {
        self.degree() + 1
    }

    pub fn n_velocity_dofs(&self) -> usize {
        self.velocity.num_dofs()
    }

    pub fn n_pressure_dofs(&self) -> usize {
        self.pressure.num_dofs()
    }

    /// `2 (k + 1) (k + 2) + (k + 1)^2`
    pub fn n_dofs(&self) -> usize {
        self.n_velocity_dofs() + self.n_pressure_dofs()
    }

    pub fn role(&self, local_dof: usize) -> FieldRole {
        if local_dof < self.n_velocity_dofs() {
            FieldRole::Velocity
        } else {
            FieldRole::Pressure
        }
    }

    /// Local indices of the dofs associated with the given face.
    pub fn face_dofs(&self, face: usize) -> Range<usize> {
        let n = self.dofs_per_face();
        face * n..(face + 1) * n
    }

    /// The face a local dof is associated with, if any.
    pub fn face_of_dof(&self, local_dof: usize) -> Option<usize> {
        let n = self.dofs_per_face();
        let face = local_dof / n;
        (face < self.faces_per_cell()).then_some(face)
    }

    pub fn velocity_space(&self) -> &RaviartThomasQuad {
        &self.velocity
    }

    pub fn pressure_space(&self) -> &DiscontinuousQuad {
        &self.pressure
    }

    /// Evaluates all reference basis functions at `xi`.
    ///
    /// All slices must have length [`n_dofs`](Self::n_dofs). Velocity values and divergences
    /// are zero for pressure dofs and vice versa.
    pub fn populate_reference_values(
        &self,
        xi: &Point2<f64>,
        velocity: &mut [Vector2<f64>],
        divergence: &mut [f64],
        pressure: &mut [f64],
    ) {
        let n_u = self.n_velocity_dofs();
        velocity.fill(Vector2::zeros());
        divergence.fill(0.0);
        pressure.fill(0.0);
        self.velocity
            .populate_values(xi, &mut velocity[..n_u], &mut divergence[..n_u]);
        self.pressure.populate_values(xi, &mut pressure[n_u..]);
    }
}
