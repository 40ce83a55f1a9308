use crate::element::FiniteElement;
use itertools::Itertools;
use nalgebra::{distance, Matrix1x4, Matrix2, Matrix2x4, OPoint, Point2, Vector2};

/// Sign of the reference normal component of the face shape functions relative to the
/// outward normal of each reference face.
pub const REFERENCE_FACE_OUTWARD_SIGNS: [f64; 4] = [-1.0, 1.0, 1.0, -1.0];

/// Bilinear quadrilateral geometry.
///
/// The reference element is `[-1, 1]^2` with vertices ordered counter-clockwise starting at
/// `(-1, -1)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quad4d2Element {
    vertices: [Point2<f64>; 4],
}

impl Quad4d2Element {
    pub fn from_vertices(vertices: [Point2<f64>; 4]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point2<f64>; 4] {
        &self.vertices
    }

    pub fn reference() -> Self {
        Self::from_vertices([
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(-1.0, 1.0),
        ])
    }

    #[rustfmt::skip]
    fn evaluate_basis(&self, xi: &Point2<f64>) -> Matrix1x4<f64> {
        // N_{alpha, beta}([alpha, beta]) = 1 with alpha, beta = 1 or -1
        let phi = |alpha: f64, beta: f64, xi: &Point2<f64>| (1.0 + alpha * xi[0]) * (1.0 + beta * xi[1]) / 4.0;
        Matrix1x4::from_row_slice(&[
            phi(-1.0, -1.0, xi),
            phi( 1.0, -1.0, xi),
            phi( 1.0,  1.0, xi),
            phi(-1.0,  1.0, xi),
        ])
    }

    #[rustfmt::skip]
    fn gradients(&self, xi: &Point2<f64>) -> Matrix2x4<f64> {
        let phi_grad = |alpha: f64, beta: f64, xi: &Point2<f64>|
            Vector2::new(
                alpha * (1.0 + beta * xi[1]) / 4.0,
                beta * (1.0 + alpha * xi[0]) / 4.0,
            );

        Matrix2x4::from_columns(&[
            phi_grad(-1.0, -1.0, xi),
            phi_grad( 1.0, -1.0, xi),
            phi_grad( 1.0,  1.0, xi),
            phi_grad(-1.0,  1.0, xi),
        ])
    }

    /// The point on reference face `face` at face parameter `t` in `[-1, 1]`.
    ///
    /// Face `f` runs from reference vertex `f` to reference vertex `f + 1`.
    #[rustfmt::skip]
    pub fn reference_face_point(face: usize, t: f64) -> Point2<f64> {
        match face {
            0 => Point2::new(   t, -1.0),
            1 => Point2::new( 1.0,    t),
            2 => Point2::new(  -t,  1.0),
            _ => Point2::new(-1.0,   -t),
        }
    }

    /// Derivative of [`reference_face_point`](Self::reference_face_point) with respect to `t`.
    #[rustfmt::skip]
    pub fn reference_face_tangent(face: usize) -> Vector2<f64> {
        match face {
            0 => Vector2::new( 1.0,  0.0),
            1 => Vector2::new( 0.0,  1.0),
            2 => Vector2::new(-1.0,  0.0),
            _ => Vector2::new( 0.0, -1.0),
        }
    }

    /// Length of face `face` in physical space.
    pub fn face_length(&self, face: usize) -> f64 {
        distance(&self.vertices[face % 4], &self.vertices[(face + 1) % 4])
    }

    /// Physical tangent `dx/dt` of face `face` at face parameter `t`.
    ///
    /// For a counter-clockwise cell the outward normal is the tangent rotated clockwise.
    pub fn face_tangent(&self, face: usize, t: f64) -> Vector2<f64> {
        let xi = Self::reference_face_point(face, t);
        self.reference_jacobian(&xi) * Self::reference_face_tangent(face)
    }
}

impl FiniteElement for Quad4d2Element {
    #[allow(non_snake_case)]
    fn map_reference_coords(&self, xi: &Point2<f64>) -> Point2<f64> {
        let X: Matrix2x4<f64> = Matrix2x4::from_fn(|i, j| self.vertices[j][i]);
        let N = self.evaluate_basis(xi);
        OPoint::from(X * N.transpose())
    }

    #[allow(non_snake_case)]
    fn reference_jacobian(&self, xi: &Point2<f64>) -> Matrix2<f64> {
        let X: Matrix2x4<f64> = Matrix2x4::from_fn(|i, j| self.vertices[j][i]);
        let G = self.gradients(xi);
        X * G.transpose()
    }

    fn diameter(&self) -> f64 {
        self.vertices
            .iter()
            .tuple_combinations()
            .map(|(x, y)| distance(x, y))
            .fold(0.0, f64::max)
    }
}
