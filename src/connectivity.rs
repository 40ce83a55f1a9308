use crate::element::Quad4d2Element;
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OPoint, Point2, U2};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

pub trait Connectivity: Clone {
    type FaceConnectivity: Connectivity;

    fn num_faces(&self) -> usize;
    fn get_face_connectivity(&self, index: usize) -> Option<Self::FaceConnectivity>;

    fn vertex_indices(&self) -> &[usize];
}

impl Connectivity for () {
    type FaceConnectivity = ();

    fn num_faces(&self) -> usize {
        0
    }

    fn get_face_connectivity(&self, _index: usize) -> Option<Self::FaceConnectivity> {
        None
    }

    fn vertex_indices(&self) -> &[usize] {
        const EMPTY_SLICE: &[usize] = &[];
        EMPTY_SLICE
    }
}

pub trait ConnectivityMut: Connectivity {
    fn vertex_indices_mut(&mut self) -> &mut [usize];
}

/// Connectivity that can produce the geometric cell it describes.
pub trait CellConnectivity<D>: Connectivity
where
    D: DimName,
    DefaultAllocator: Allocator<f64, D>,
{
    type Cell;

    fn cell(&self, vertices: &[OPoint<f64, D>]) -> Option<Self::Cell>;
}

/// Connectivity for a line segment embedded in two dimensions.
///
/// The segment is directed from the first to the second vertex.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment2d2Connectivity(pub [usize; 2]);

impl Connectivity for Segment2d2Connectivity {
    type FaceConnectivity = ();

    fn num_faces(&self) -> usize {
        0
    }

    fn get_face_connectivity(&self, _index: usize) -> Option<Self::FaceConnectivity> {
        None
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

impl ConnectivityMut for Segment2d2Connectivity {
    fn vertex_indices_mut(&mut self) -> &mut [usize] {
        &mut self.0
    }
}

impl Segment2d2Connectivity {
    /// The vertex indices in ascending order.
    ///
    /// Two cells sharing this segment see it with opposite directions, but agree on the
    /// sorted key.
    pub fn sorted(&self) -> [usize; 2] {
        let [a, b] = self.0;
        if a <= b {
            [a, b]
        } else {
            [b, a]
        }
    }
}

/// Connectivity for a bilinear quadrilateral in two dimensions.
///
/// Vertices are ordered counter-clockwise, and face `i` connects vertex `i` to vertex
/// `(i + 1) % 4`:
///
/// ```text
/// 3___(f2)___2
/// |          |
/// (f3)     (f1)
/// |___(f0)___|
/// 0          1
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quad4d2Connectivity(pub [usize; 4]);

impl Deref for Quad4d2Connectivity {
    type Target = [usize; 4];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Quad4d2Connectivity {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Connectivity for Quad4d2Connectivity {
    type FaceConnectivity = Segment2d2Connectivity;

    fn num_faces(&self) -> usize {
        4
    }

    fn get_face_connectivity(&self, index: usize) -> Option<Self::FaceConnectivity> {
        let idx = &self.0;
        if index < 4 {
            Some(Segment2d2Connectivity([idx[index], idx[(index + 1) % 4]]))
        } else {
            None
        }
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

impl ConnectivityMut for Quad4d2Connectivity {
    fn vertex_indices_mut(&mut self) -> &mut [usize] {
        &mut self.0
    }
}

impl CellConnectivity<U2> for Quad4d2Connectivity {
    type Cell = Quad4d2Element;

    fn cell(&self, vertices: &[Point2<f64>]) -> Option<Self::Cell> {
        let mut cell_vertices = [Point2::origin(); 4];
        for (v, &idx) in cell_vertices.iter_mut().zip(&self.0) {
            *v = *vertices.get(idx)?;
        }
        Some(Quad4d2Element::from_vertices(cell_vertices))
    }
}
