//! Lower level details for refinement abstractions.

use crate::connectivity::Quad4d2Connectivity;
use crate::mesh::refinement::{InvalidVertexCount, RefineConnectivity, UniformRefinement, VertexRepresentation};
use core::cmp::{max, min};
use core::hash::{Hash, Hasher};
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OPoint, RealField};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexLabel(pub usize);

impl VertexRepresentation for VertexLabel {
    fn construct_vertex<T, D>(&self, all_vertices: &[OPoint<T, D>]) -> OPoint<T, D>
    where
        T: RealField,
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        let &Self(vertex_idx) = self;
        all_vertices[vertex_idx].clone()
    }
}

#[derive(Debug, Copy, Clone, Eq)]
pub struct EdgeMidpointLabel(pub [usize; 2]);

impl EdgeMidpointLabel {
    fn canonical_vertex_indices(&self) -> [usize; 2] {
        let &EdgeMidpointLabel([a, b]) = self;
        [min(a, b), max(a, b)]
    }
}

impl VertexRepresentation for EdgeMidpointLabel {
    fn construct_vertex<T, D>(&self, all_vertices: &[OPoint<T, D>]) -> OPoint<T, D>
    where
        T: RealField,
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        let [a, b] = self.0.map(|idx| &all_vertices[idx]);
        OPoint::from((&a.coords + &b.coords) / T::from_subset(&2.0))
    }
}

impl PartialEq for EdgeMidpointLabel {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_vertex_indices() == other.canonical_vertex_indices()
    }
}

impl Hash for EdgeMidpointLabel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_vertex_indices().hash(state)
    }
}

/// The centroid of a quadrilateral, identified by its (unordered) vertex indices.
#[derive(Debug, Copy, Clone, Eq)]
pub struct QuadCenterLabel(pub [usize; 4]);

impl QuadCenterLabel {
    fn canonical_vertex_indices(&self) -> [usize; 4] {
        let mut indices = self.0;
        indices.sort_unstable();
        indices
    }
}

impl VertexRepresentation for QuadCenterLabel {
    fn construct_vertex<T, D>(&self, all_vertices: &[OPoint<T, D>]) -> OPoint<T, D>
    where
        T: RealField,
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        let [a, b, c, d] = self.0.map(|idx| &all_vertices[idx]);
        OPoint::from((&a.coords + &b.coords + &c.coords + &d.coords) / T::from_subset(&4.0))
    }
}

impl PartialEq for QuadCenterLabel {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_vertex_indices() == other.canonical_vertex_indices()
    }
}

impl Hash for QuadCenterLabel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_vertex_indices().hash(state)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum QuadRefinementVertex {
    Vertex(VertexLabel),
    EdgeMidpoint(EdgeMidpointLabel),
    Center(QuadCenterLabel),
}

impl From<VertexLabel> for QuadRefinementVertex {
    fn from(label: VertexLabel) -> Self {
        Self::Vertex(label)
    }
}

impl From<EdgeMidpointLabel> for QuadRefinementVertex {
    fn from(label: EdgeMidpointLabel) -> Self {
        Self::EdgeMidpoint(label)
    }
}

impl From<QuadCenterLabel> for QuadRefinementVertex {
    fn from(label: QuadCenterLabel) -> Self {
        Self::Center(label)
    }
}

impl VertexRepresentation for QuadRefinementVertex {
    fn construct_vertex<T, D>(&self, all_vertices: &[OPoint<T, D>]) -> OPoint<T, D>
    where
        T: RealField,
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        match self {
            Self::Vertex(label) => label.construct_vertex(all_vertices),
            Self::EdgeMidpoint(label) => label.construct_vertex(all_vertices),
            Self::Center(label) => label.construct_vertex(all_vertices),
        }
    }
}

pub fn edge_midpoint(vertices: [usize; 2]) -> EdgeMidpointLabel {
    EdgeMidpointLabel(vertices)
}

pub fn vertex(vertex: usize) -> VertexLabel {
    VertexLabel(vertex)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IntermediateQuad4d2([QuadRefinementVertex; 4]);

impl RefineConnectivity<Quad4d2Connectivity> for UniformRefinement {
    type Intermediate = IntermediateQuad4d2;
    type OutputConnectivity = Quad4d2Connectivity;
    type VertexLabel = QuadRefinementVertex;

    /// Splits a quadrilateral into four, each child keeping the counter-clockwise orientation
    /// of the parent:
    ///
    /// ```text
    /// 3_____g_____2
    /// |     |     |
    /// |  3  |  2  |
    /// h_____c_____f
    /// |     |     |
    /// |  0  |  1  |
    /// 0_____e_____1
    /// ```
    fn populate_refined_connectivity(
        &self,
        connectivity: &Quad4d2Connectivity,
        intermediates: &mut Vec<Self::Intermediate>,
    ) {
        let &Quad4d2Connectivity(indices) = connectivity;
        let [a, b, c, d] = indices;
        let e = edge_midpoint([a, b]).into();
        let f = edge_midpoint([b, c]).into();
        let g = edge_midpoint([c, d]).into();
        let h = edge_midpoint([d, a]).into();
        let center = QuadCenterLabel(indices).into();
        let [a, b, c, d] = indices.map(|vertex_idx| vertex(vertex_idx).into());

        intermediates.extend_from_slice(&[
            IntermediateQuad4d2([a, e, center, h]),
            IntermediateQuad4d2([e, b, f, center]),
            IntermediateQuad4d2([center, f, c, g]),
            IntermediateQuad4d2([h, center, g, d]),
        ]);
    }

    fn populate_vertex_labels(&self, intermediate: &Self::Intermediate, labels: &mut Vec<Self::VertexLabel>) {
        labels.extend_from_slice(&intermediate.0);
    }

    fn populate_refined_face_labels(&self, face_vertices: &[usize], faces: &mut Vec<Vec<Self::VertexLabel>>) {
        if let &[a, b] = face_vertices {
            let midpoint: QuadRefinementVertex = edge_midpoint([a, b]).into();
            faces.push(vec![vertex(a).into(), midpoint]);
            faces.push(vec![midpoint, vertex(b).into()]);
        }
    }

    fn construct_output_connectivity(
        &self,
        _intermediate: &Self::Intermediate,
        vertex_indices: &[usize],
    ) -> Result<Self::OutputConnectivity, InvalidVertexCount> {
        Ok(Quad4d2Connectivity(
            vertex_indices.try_into().map_err(|_| InvalidVertexCount)?,
        ))
    }
}
