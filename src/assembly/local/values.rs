//! Physical basis function values on cells and faces.
//!
//! Velocity shape functions are mapped with the contravariant Piola transform
//! `phi = J phi_ref / det J`, which preserves normal fluxes, so that divergences transform as
//! `div phi = div_ref phi_ref / det J`. Face shape functions are additionally scaled by half
//! the face length and the orientation sign recorded in the dof map, so that a global face
//! dof is the normal velocity along the canonical face normal at its node.
use crate::element::{FiniteElement, MixedElement, Quad4d2Element};
use crate::quadrature::{QuadraturePair1d, QuadraturePair2d};
use crate::{DarcyError, Result};
use nalgebra::{Matrix2, Point2, Vector2, Vector3};

fn check_orientations(orientations: &[f64], n_dofs: usize) -> Result<()> {
    if orientations.len() != n_dofs {
        return Err(DarcyError::Assembly(format!(
            "expected {} orientation signs, got {}",
            n_dofs,
            orientations.len()
        )));
    }
    Ok(())
}

fn positive_jacobian(cell: &Quad4d2Element, xi: &Point2<f64>) -> Result<(Matrix2<f64>, f64)> {
    let jacobian = cell.reference_jacobian(xi);
    let det = jacobian.determinant();
    if det > 0.0 && det.is_finite() {
        Ok((jacobian, det))
    } else {
        Err(DarcyError::Assembly(format!(
            "cell with vertices {:?} is degenerate or inverted (det J = {:e})",
            cell.vertices(),
            det
        )))
    }
}

/// Scale of each local shape function: orientation sign times half the face length for face
/// dofs, and one otherwise.
fn dof_scales(element: &MixedElement, cell: &Quad4d2Element, orientations: &[f64], scales: &mut [f64]) {
    for (i, (scale, &orientation)) in scales.iter_mut().zip(orientations).enumerate() {
        *scale = match element.face_of_dof(i) {
            Some(face) => orientation * 0.5 * cell.face_length(face),
            None => orientation,
        };
    }
}

/// Shape function values, divergences and weights at the quadrature points of a cell.
///
/// Values are stored point by point: the value of shape function `i` at point `q` is at
/// index `q * n_dofs + i`.
#[derive(Debug, Clone)]
pub struct CellValues {
    element: MixedElement,
    n_dofs: usize,
    reference_points: Vec<Point2<f64>>,
    weights: Vec<f64>,
    reference_velocity: Vec<Vector2<f64>>,
    reference_divergence: Vec<f64>,
    reference_pressure: Vec<f64>,
    scales: Vec<f64>,
    points: Vec<Point2<f64>>,
    jxw: Vec<f64>,
    velocity: Vec<Vector2<f64>>,
    divergence: Vec<f64>,
}

impl CellValues {
    pub fn new(element: &MixedElement, quadrature: &QuadraturePair2d) -> Self {
        let (weights, reference_points) = quadrature.clone();
        let n_dofs = element.n_dofs();
        let n_q = weights.len();

        let mut reference_velocity = vec![Vector2::zeros(); n_q * n_dofs];
        let mut reference_divergence = vec![0.0; n_q * n_dofs];
        let mut reference_pressure = vec![0.0; n_q * n_dofs];
        for (q, xi) in reference_points.iter().enumerate() {
            let range = q * n_dofs..(q + 1) * n_dofs;
            element.populate_reference_values(
                xi,
                &mut reference_velocity[range.clone()],
                &mut reference_divergence[range.clone()],
                &mut reference_pressure[range],
            );
        }

        Self {
            element: element.clone(),
            n_dofs,
            reference_points,
            weights,
            reference_velocity,
            reference_divergence,
            reference_pressure,
            scales: vec![1.0; n_dofs],
            points: vec![Point2::origin(); n_q],
            jxw: vec![0.0; n_q],
            velocity: vec![Vector2::zeros(); n_q * n_dofs],
            divergence: vec![0.0; n_q * n_dofs],
        }
    }

    /// Maps the reference values onto `cell`.
    ///
    /// # Errors
    ///
    /// Returns an assembly error if `orientations` does not have one entry per local dof, or
    /// if the Jacobian determinant is not positive at some quadrature point.
    pub fn reinit(&mut self, cell: &Quad4d2Element, orientations: &[f64]) -> Result<()> {
        check_orientations(orientations, self.n_dofs)?;
        dof_scales(&self.element, cell, orientations, &mut self.scales);

        let n = self.n_dofs;
        for (q, xi) in self.reference_points.iter().enumerate() {
            let (jacobian, det) = positive_jacobian(cell, xi)?;
            self.points[q] = cell.map_reference_coords(xi);
            self.jxw[q] = self.weights[q] * det;
            for i in 0..n {
                let s = self.scales[i] / det;
                self.velocity[q * n + i] = jacobian * self.reference_velocity[q * n + i] * s;
                self.divergence[q * n + i] = self.reference_divergence[q * n + i] * s;
            }
        }
        Ok(())
    }

    pub fn n_dofs(&self) -> usize {
        self.n_dofs
    }

    pub fn n_quadrature_points(&self) -> usize {
        self.weights.len()
    }

    pub fn quadrature_points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn quadrature_point(&self, q: usize) -> &Point2<f64> {
        &self.points[q]
    }

    /// Quadrature weight times Jacobian determinant.
    pub fn jxw(&self, q: usize) -> f64 {
        self.jxw[q]
    }

    pub fn velocity(&self, i: usize, q: usize) -> &Vector2<f64> {
        &self.velocity[q * self.n_dofs + i]
    }

    pub fn divergence(&self, i: usize, q: usize) -> f64 {
        self.divergence[q * self.n_dofs + i]
    }

    pub fn pressure(&self, i: usize, q: usize) -> f64 {
        self.reference_pressure[q * self.n_dofs + i]
    }

    /// Interpolates the discrete solution `[u_x, u_y, p]` at every quadrature point, given
    /// the coefficients of the local dofs.
    pub fn solution_values(&self, coefficients: &[f64], values: &mut [Vector3<f64>]) -> Result<()> {
        if coefficients.len() != self.n_dofs || values.len() != self.n_quadrature_points() {
            return Err(DarcyError::Assembly(format!(
                "cannot interpolate {} coefficients into {} values at {} points",
                coefficients.len(),
                values.len(),
                self.n_quadrature_points()
            )));
        }
        for (q, value) in values.iter_mut().enumerate() {
            let mut u = Vector2::zeros();
            let mut p = 0.0;
            for (i, &c) in coefficients.iter().enumerate() {
                u += self.velocity(i, q) * c;
                p += self.pressure(i, q) * c;
            }
            *value = Vector3::new(u.x, u.y, p);
        }
        Ok(())
    }
}

/// Shape function values, outward normals and weights at the quadrature points of one face
/// of a cell.
#[derive(Debug, Clone)]
pub struct FaceValues {
    element: MixedElement,
    n_dofs: usize,
    weights: Vec<f64>,
    face_parameters: Vec<f64>,
    // Indexed by face, then point by point as in `CellValues`
    reference_velocity: Vec<Vec<Vector2<f64>>>,
    scales: Vec<f64>,
    points: Vec<Point2<f64>>,
    normals: Vec<Vector2<f64>>,
    jxw: Vec<f64>,
    velocity: Vec<Vector2<f64>>,
}

impl FaceValues {
    pub fn new(element: &MixedElement, face_quadrature: &QuadraturePair1d) -> Self {
        let (weights, face_points) = face_quadrature;
        let face_parameters: Vec<f64> = face_points.iter().map(|t| t.x).collect();
        let n_dofs = element.n_dofs();
        let n_q = weights.len();

        let mut divergence = vec![0.0; n_dofs];
        let mut pressure = vec![0.0; n_dofs];
        let reference_velocity = (0..element.faces_per_cell())
            .map(|face| {
                let mut values = vec![Vector2::zeros(); n_q * n_dofs];
                for (q, &t) in face_parameters.iter().enumerate() {
                    let xi = Quad4d2Element::reference_face_point(face, t);
                    element.populate_reference_values(
                        &xi,
                        &mut values[q * n_dofs..(q + 1) * n_dofs],
                        &mut divergence,
                        &mut pressure,
                    );
                }
                values
            })
            .collect();

        Self {
            element: element.clone(),
            n_dofs,
            weights: weights.clone(),
            face_parameters,
            reference_velocity,
            scales: vec![1.0; n_dofs],
            points: vec![Point2::origin(); n_q],
            normals: vec![Vector2::zeros(); n_q],
            jxw: vec![0.0; n_q],
            velocity: vec![Vector2::zeros(); n_q * n_dofs],
        }
    }

    /// Maps the reference values onto face `face` of `cell`.
    pub fn reinit(&mut self, cell: &Quad4d2Element, face: usize, orientations: &[f64]) -> Result<()> {
        check_orientations(orientations, self.n_dofs)?;
        if face >= self.reference_velocity.len() {
            return Err(DarcyError::Assembly(format!("invalid local face index {}", face)));
        }
        dof_scales(&self.element, cell, orientations, &mut self.scales);

        let n = self.n_dofs;
        let reference_tangent = Quad4d2Element::reference_face_tangent(face);
        for (q, &t) in self.face_parameters.iter().enumerate() {
            let xi = Quad4d2Element::reference_face_point(face, t);
            let (jacobian, det) = positive_jacobian(cell, &xi)?;
            let tangent = jacobian * reference_tangent;
            let length_scale = tangent.norm();
            self.points[q] = cell.map_reference_coords(&xi);
            self.normals[q] = Vector2::new(tangent.y, -tangent.x) / length_scale;
            self.jxw[q] = self.weights[q] * length_scale;
            for i in 0..n {
                let s = self.scales[i] / det;
                self.velocity[q * n + i] = jacobian * self.reference_velocity[face][q * n + i] * s;
            }
        }
        Ok(())
    }

    pub fn n_quadrature_points(&self) -> usize {
        self.weights.len()
    }

    pub fn quadrature_points(&self) -> &[Point2<f64>] {
        &self.points
    }

    /// Outward unit normal at face quadrature point `q`.
    pub fn normal(&self, q: usize) -> &Vector2<f64> {
        &self.normals[q]
    }

    /// Quadrature weight times the length scale of the face.
    pub fn jxw(&self, q: usize) -> f64 {
        self.jxw[q]
    }

    pub fn velocity(&self, i: usize, q: usize) -> &Vector2<f64> {
        &self.velocity[q * self.n_dofs + i]
    }
}
