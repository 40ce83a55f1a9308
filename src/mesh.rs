use crate::connectivity::{CellConnectivity, Connectivity, ConnectivityMut, Quad4d2Connectivity};
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OPoint, OVector, Scalar, U2, U3};
use std::collections::BTreeMap;

pub mod procedural;
pub mod refinement;

/// Integer tag attached to a boundary face.
pub type BoundaryId = u32;

/// The boundary id of faces that were never tagged, including all interior faces.
pub const UNTAGGED: BoundaryId = 0;

/// Index-based data structure for conforming meshes (i.e. no hanging nodes).
///
/// In addition to vertices and cell connectivity, the mesh stores a [`BoundaryId`] for tagged
/// boundary faces. Tags are keyed by the sorted vertex indices of the face, so they do not
/// depend on which cell (or which local face) the face is seen from.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh<T: Scalar, D, Connectivity>
where
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    vertices: Vec<OPoint<T, D>>,
    connectivity: Vec<Connectivity>,
    boundary_ids: BTreeMap<Vec<usize>, BoundaryId>,
}

pub type Mesh2d<T, Connectivity> = Mesh<T, U2, Connectivity>;
pub type Mesh3d<T, Connectivity> = Mesh<T, U3, Connectivity>;

pub type QuadMesh2d<T> = Mesh2d<T, Quad4d2Connectivity>;

fn sorted_face_key(face_vertices: &[usize]) -> Vec<usize> {
    let mut key = face_vertices.to_vec();
    key.sort_unstable();
    key
}

impl<T, D, Connectivity> Mesh<T, D, Connectivity>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn vertices(&self) -> &[OPoint<T, D>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[Connectivity] {
        &self.connectivity
    }

    /// Construct a mesh from vertices and connectivity.
    ///
    /// The provided connectivity is expected only to return valid (i.e. in-bounds) indices,
    /// but this can not be trusted. Users of the mesh are permitted to panic if they encounter
    /// invalid indices.
    ///
    /// The resulting mesh has no tagged boundary faces.
    pub fn from_vertices_and_connectivity(vertices: Vec<OPoint<T, D>>, connectivity: Vec<Connectivity>) -> Self {
        Self {
            vertices,
            connectivity,
            boundary_ids: BTreeMap::new(),
        }
    }

    /// Returns the boundary id of the face with the given vertices, in any order.
    ///
    /// Faces that have not been tagged report [`UNTAGGED`].
    pub fn boundary_id(&self, face_vertices: &[usize]) -> BoundaryId {
        self.boundary_ids
            .get(&sorted_face_key(face_vertices))
            .copied()
            .unwrap_or(UNTAGGED)
    }

    /// Assigns a boundary id to the face with the given vertices.
    ///
    /// Assigning [`UNTAGGED`] removes any existing tag.
    pub fn set_boundary_id(&mut self, face_vertices: &[usize], id: BoundaryId) {
        let key = sorted_face_key(face_vertices);
        if id == UNTAGGED {
            self.boundary_ids.remove(&key);
        } else {
            self.boundary_ids.insert(key, id);
        }
    }

    /// Iterates over all tagged faces, as sorted vertex indices together with their id.
    pub fn tagged_faces(&self) -> impl '_ + Iterator<Item = (&[usize], BoundaryId)> {
        self.boundary_ids
            .iter()
            .map(|(key, &id)| (key.as_slice(), id))
    }

    pub fn num_tagged_faces(&self) -> usize {
        self.boundary_ids.len()
    }
}

impl<D, C> Mesh<f64, D, C>
where
    D: DimName,
    DefaultAllocator: Allocator<f64, D>,
    C: CellConnectivity<D>,
{
    pub fn get_cell(&self, index: usize) -> Option<C::Cell> {
        self.connectivity()
            .get(index)
            .and_then(|conn| conn.cell(self.vertices()))
    }
}

impl<T, D, C> Mesh<T, D, C>
where
    T: Scalar,
    D: DimName,
    C: ConnectivityMut,
    DefaultAllocator: Allocator<T, D>,
{
    /// Creates a new mesh with each cell disconnected from all its neighbors.
    ///
    /// In other words, each vertex is only referenced exactly once, and the result is
    /// effectively a "soup" of cells. Vertex `4 * i + j` of the result is local vertex `j`
    /// of cell `i` for quadrilateral meshes. Boundary tags are not carried over.
    pub fn disconnect_cells(&self) -> Self {
        let old_vertices = self.vertices();
        let mut new_vertices = Vec::new();
        let mut new_connectivity = Vec::new();

        for conn in self.connectivity() {
            let mut new_conn = conn.clone();

            for v_idx in new_conn.vertex_indices_mut() {
                let new_vertex_idx = new_vertices.len();
                new_vertices.push(old_vertices[*v_idx].clone());
                *v_idx = new_vertex_idx;
            }
            new_connectivity.push(new_conn);
        }

        Self::from_vertices_and_connectivity(new_vertices, new_connectivity)
    }
}

impl<T, D, C> Mesh<T, D, C>
where
    T: Scalar,
    D: DimName,
    C: Connectivity,
    C::FaceConnectivity: Connectivity,
    DefaultAllocator: Allocator<T, D>,
{
    /// Finds faces which are only connected to exactly one cell, along with the connected cell
    /// index and the local index of the face within that cell.
    ///
    /// Faces are returned in the order of their sorted vertex indices.
    pub fn find_boundary_faces(&self) -> Vec<(C::FaceConnectivity, usize, usize)> {
        // Count the number of occurrences of "equivalent" faces (in the sense that they refer
        // to the same vertex indices). Use a BTreeMap to avoid non-determinism due to
        // HashMap's internal randomization.
        let mut face_counts = BTreeMap::new();
        for (conn_idx, cell_conn) in self.connectivity.iter().enumerate() {
            for local_idx in 0..cell_conn.num_faces() {
                if let Some(face_conn) = cell_conn.get_face_connectivity(local_idx) {
                    let key = sorted_face_key(face_conn.vertex_indices());
                    face_counts
                        .entry(key)
                        .and_modify(|(_, count)| *count += 1)
                        .or_insert(((face_conn, conn_idx, local_idx), 1));
                }
            }
        }

        face_counts
            .into_values()
            .filter(|(_, count)| *count == 1)
            .map(|(info, _)| info)
            .collect()
    }

    /// Same as [`find_boundary_faces`](Self::find_boundary_faces), with the boundary id of
    /// each face appended.
    pub fn find_boundary_faces_with_ids(&self) -> Vec<(C::FaceConnectivity, usize, usize, BoundaryId)> {
        self.find_boundary_faces()
            .into_iter()
            .map(|(face, cell_idx, local_idx)| {
                let id = self.boundary_id(face.vertex_indices());
                (face, cell_idx, local_idx, id)
            })
            .collect()
    }
}

impl<D, C> Mesh<f64, D, C>
where
    D: DimName,
    C: Connectivity,
    C::FaceConnectivity: Connectivity,
    DefaultAllocator: Allocator<f64, D>,
{
    /// Tags boundary faces based on the centroid of each face.
    ///
    /// The predicate is invoked once per boundary face. Returning `Some(id)` assigns `id` to
    /// the face, `None` leaves the current tag untouched. Returns the number of faces that
    /// were tagged.
    pub fn tag_boundary_faces<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&OPoint<f64, D>) -> Option<BoundaryId>,
    {
        let mut num_tagged = 0;
        for (face, _, _) in self.find_boundary_faces() {
            let face_vertices = face.vertex_indices();
            let mut centroid = OVector::<f64, D>::zeros();
            for &v_idx in face_vertices {
                centroid += &self.vertices[v_idx].coords;
            }
            centroid /= face_vertices.len() as f64;

            if let Some(id) = predicate(&OPoint::from(centroid)) {
                self.set_boundary_id(face_vertices, id);
                num_tagged += 1;
            }
        }
        num_tagged
    }
}
