//! Enumeration of global degrees of freedom for the mixed element.
use crate::block::BlockSizes;
use crate::connectivity::Connectivity;
use crate::element::{FieldRole, MixedElement, REFERENCE_FACE_OUTWARD_SIGNS};
use crate::mesh::Mesh;
use crate::{DarcyError, Result};
use log::{debug, info};
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName};
use rustc_hash::FxHashMap;
use std::ops::Range;

/// Map from `(cell, local dof)` to global dof indices.
///
/// Face dofs are shared between the two cells adjacent to a face. Every face has a canonical
/// normal, the outward normal of the first cell (in cell order) containing it, and a global
/// face dof is the normal velocity along that canonical normal. The orientation stored for
/// each `(cell, local dof)` pair maps the reference shape function onto that convention.
///
/// Global indices are block-contiguous: velocity dofs occupy `0..n_u` and pressure dofs
/// `n_u..n_u + n_p`.
#[derive(Debug, Clone, PartialEq)]
pub struct DofMap {
    dofs_per_cell: usize,
    cell_dofs: Vec<usize>,
    cell_orientations: Vec<f64>,
    block_sizes: BlockSizes,
}

struct FaceRecord {
    first_dof: usize,
    owner: usize,
    num_cells: usize,
}

impl DofMap {
    /// Distributes the degrees of freedom of `element` on `mesh`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the geometric dimension of the mesh differs from the
    /// dimension of the element, if a cell is not a quadrilateral, or if a face is shared by
    /// more than two cells.
    pub fn assign<D, C>(mesh: &Mesh<f64, D, C>, element: &MixedElement) -> Result<Self>
    where
        D: DimName,
        C: Connectivity,
        DefaultAllocator: Allocator<f64, D>,
    {
        if D::dim() != element.dim() {
            return Err(DarcyError::Configuration(format!(
                "mesh dimension ({}) does not match element dimension ({})",
                D::dim(),
                element.dim()
            )));
        }

        let num_cells = mesh.connectivity().len();
        let dofs_per_cell = element.n_dofs();
        let dofs_per_face = element.dofs_per_face();
        let k = element.degree();
        let n_interior = element.n_velocity_dofs() - element.faces_per_cell() * dofs_per_face;

        let mut cell_dofs = vec![0; num_cells * dofs_per_cell];
        let mut cell_orientations = vec![1.0; num_cells * dofs_per_cell];
        let mut faces: FxHashMap<[usize; 2], FaceRecord> = FxHashMap::default();
        let mut next_dof = 0;

        for (cell_idx, conn) in mesh.connectivity().iter().enumerate() {
            if conn.vertex_indices().len() != element.vertices_per_cell()
                || conn.num_faces() != element.faces_per_cell()
            {
                return Err(DarcyError::Configuration(format!(
                    "cell {} has {} vertices and {} faces, but the element requires a quadrilateral",
                    cell_idx,
                    conn.vertex_indices().len(),
                    conn.num_faces()
                )));
            }

            let local_dofs = &mut cell_dofs[cell_idx * dofs_per_cell..(cell_idx + 1) * dofs_per_cell];
            let local_orientations =
                &mut cell_orientations[cell_idx * dofs_per_cell..(cell_idx + 1) * dofs_per_cell];

            for face in 0..element.faces_per_cell() {
                let (a, b) = match conn
                    .get_face_connectivity(face)
                    .as_ref()
                    .map(Connectivity::vertex_indices)
                {
                    Some(&[a, b]) => (a, b),
                    _ => {
                        return Err(DarcyError::Configuration(format!(
                            "face {} of cell {} is not a line segment",
                            face, cell_idx
                        )))
                    }
                };
                let key = if a < b { [a, b] } else { [b, a] };

                let record = faces.entry(key).or_insert_with(|| {
                    let record = FaceRecord {
                        first_dof: next_dof,
                        owner: cell_idx,
                        num_cells: 0,
                    };
                    next_dof += dofs_per_face;
                    record
                });
                record.num_cells += 1;
                if record.num_cells > 2 {
                    return Err(DarcyError::Configuration(format!(
                        "face ({}, {}) is shared by more than two cells",
                        key[0], key[1]
                    )));
                }

                let sign = if record.owner == cell_idx {
                    REFERENCE_FACE_OUTWARD_SIGNS[face]
                } else {
                    -REFERENCE_FACE_OUTWARD_SIGNS[face]
                };
                for (j, local) in element.face_dofs(face).enumerate() {
                    // Local face dofs run from a to b, global ones from min(a, b) to max(a, b)
                    let canonical = if a < b { j } else { k - j };
                    local_dofs[local] = record.first_dof + canonical;
                    local_orientations[local] = sign;
                }
            }

            let interior_start = element.faces_per_cell() * dofs_per_face;
            for local in interior_start..interior_start + n_interior {
                local_dofs[local] = next_dof;
                next_dof += 1;
            }
        }

        let n_velocity = next_dof;
        let n_pressure_per_cell = element.n_pressure_dofs();
        let pressure_start = element.n_velocity_dofs();
        for cell_idx in 0..num_cells {
            let local_dofs = &mut cell_dofs[cell_idx * dofs_per_cell..(cell_idx + 1) * dofs_per_cell];
            for i in 0..n_pressure_per_cell {
                local_dofs[pressure_start + i] = n_velocity + cell_idx * n_pressure_per_cell + i;
            }
        }

        let block_sizes = BlockSizes::new(n_velocity, num_cells * n_pressure_per_cell);
        debug!("Distributed dofs over {} faces and {} cells", faces.len(), num_cells);
        info!(
            "Number of degrees of freedom: {} ({}+{})",
            block_sizes.total(),
            block_sizes.velocity,
            block_sizes.pressure
        );

        Ok(Self {
            dofs_per_cell,
            cell_dofs,
            cell_orientations,
            block_sizes,
        })
    }

    pub fn n_dofs(&self) -> usize {
        self.block_sizes.total()
    }

    pub fn n_cells(&self) -> usize {
        self.cell_dofs.len() / self.dofs_per_cell.max(1)
    }

    pub fn dofs_per_cell(&self) -> usize {
        self.dofs_per_cell
    }

    pub fn block_sizes(&self) -> BlockSizes {
        self.block_sizes
    }

    /// Global indices of the dofs of a cell, in local order.
    pub fn cell_dofs(&self, cell: usize) -> &[usize] {
        &self.cell_dofs[cell * self.dofs_per_cell..(cell + 1) * self.dofs_per_cell]
    }

    /// Orientation signs of the dofs of a cell, in local order.
    ///
    /// Interior and pressure dofs always have orientation `+1`.
    pub fn cell_orientations(&self, cell: usize) -> &[f64] {
        &self.cell_orientations[cell * self.dofs_per_cell..(cell + 1) * self.dofs_per_cell]
    }

    pub fn role(&self, global_dof: usize) -> FieldRole {
        if global_dof < self.block_sizes.velocity {
            FieldRole::Velocity
        } else {
            FieldRole::Pressure
        }
    }

    pub fn velocity_range(&self) -> Range<usize> {
        self.block_sizes.velocity_range()
    }

    pub fn pressure_range(&self) -> Range<usize> {
        self.block_sizes.pressure_range()
    }
}
