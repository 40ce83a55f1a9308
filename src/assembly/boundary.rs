//! Strongly imposed boundary values.
//!
//! Boundary values are collected per global dof and then eliminated symmetrically from the
//! linear system: the column of a constrained dof is moved to the right-hand side and zeroed,
//! and its row is replaced by an identity row.
use crate::connectivity::Connectivity;
use crate::dof_map::DofMap;
use crate::element::{ComponentMask, MixedElement};
use crate::mesh::{BoundaryId, Mesh};
use crate::{DarcyError, Result};
use log::debug;
use nalgebra::allocator::Allocator;
use nalgebra::{DVector, DefaultAllocator, DimName};
use nalgebra_sparse::CsrMatrix;
use std::collections::BTreeMap;

/// Collects the dofs selected by `mask` that lie on a boundary face tagged with one of
/// `boundary_ids`. The result is sorted and free of duplicates.
///
/// Only face dofs lie on faces, so pressure dofs are never returned.
///
/// # Errors
///
/// Returns a configuration error if the mask does not have one entry per solution component.
pub fn extract_boundary_dofs<D, C>(
    mesh: &Mesh<f64, D, C>,
    dof_map: &DofMap,
    element: &MixedElement,
    mask: &ComponentMask,
    boundary_ids: &[BoundaryId],
) -> Result<Vec<usize>>
where
    D: DimName,
    C: Connectivity,
    C::FaceConnectivity: Connectivity,
    DefaultAllocator: Allocator<f64, D>,
{
    if mask.len() != element.n_components() {
        return Err(DarcyError::Configuration(format!(
            "component mask has {} entries, but the element has {} components",
            mask.len(),
            element.n_components()
        )));
    }

    let mut dofs = Vec::new();
    for (_, cell, face, id) in mesh.find_boundary_faces_with_ids() {
        if !boundary_ids.contains(&id) {
            continue;
        }
        let cell_dofs = dof_map.cell_dofs(cell);
        for local in element.face_dofs(face) {
            if mask.selects_role(element.role(local)) {
                dofs.push(cell_dofs[local]);
            }
        }
    }
    dofs.sort_unstable();
    dofs.dedup();
    Ok(dofs)
}

/// Prescribed values for a set of global dofs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryValues {
    values: BTreeMap<usize, f64>,
}

impl BoundaryValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prescribes `value` for `dof`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the dof already has a different prescribed value.
    pub fn insert(&mut self, dof: usize, value: f64) -> Result<()> {
        match self.values.get(&dof) {
            Some(&existing) if existing != value => Err(DarcyError::Configuration(format!(
                "conflicting boundary values for dof {}: {} and {}",
                dof, existing, value
            ))),
            _ => {
                self.values.insert(dof, value);
                Ok(())
            }
        }
    }

    /// Prescribes the same value for all given dofs.
    pub fn insert_all(&mut self, dofs: &[usize], value: f64) -> Result<()> {
        for &dof in dofs {
            self.insert(dof, value)?;
        }
        Ok(())
    }

    pub fn get(&self, dof: usize) -> Option<f64> {
        self.values.get(&dof).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl '_ + Iterator<Item = (usize, f64)> {
        self.values.iter().map(|(&dof, &value)| (dof, value))
    }
}

/// Eliminates the prescribed dofs from the system `matrix * x = rhs`, preserving symmetry.
///
/// After elimination, row and column `k` of every constrained dof `k` are zero except for a
/// unit diagonal, `rhs[k]` holds the prescribed value, and the right-hand side of every other
/// row has been corrected by the contribution of the prescribed values.
///
/// # Errors
///
/// Returns an assembly error on size mismatches, out-of-bounds dofs, or if the diagonal entry
/// of a constrained row is not part of the sparsity pattern.
pub fn apply_boundary_values(
    boundary_values: &BoundaryValues,
    matrix: &mut CsrMatrix<f64>,
    rhs: &mut DVector<f64>,
) -> Result<()> {
    let n = matrix.nrows();
    if matrix.ncols() != n || rhs.len() != n {
        return Err(DarcyError::Assembly(format!(
            "cannot apply boundary values to a {}x{} system with right-hand side of length {}",
            n,
            matrix.ncols(),
            rhs.len()
        )));
    }

    let mut prescribed: Vec<Option<f64>> = vec![None; n];
    for (dof, value) in boundary_values.iter() {
        let entry = prescribed
            .get_mut(dof)
            .ok_or_else(|| DarcyError::Assembly(format!("constrained dof {} is out of bounds", dof)))?;
        *entry = Some(value);
    }

    for (row_idx, mut row) in matrix.row_iter_mut().enumerate() {
        let (columns, values) = row.cols_and_values_mut();
        match prescribed[row_idx] {
            Some(row_value) => {
                let mut has_diagonal = false;
                for (&col, value) in columns.iter().zip(values.iter_mut()) {
                    if col == row_idx {
                        *value = 1.0;
                        has_diagonal = true;
                    } else {
                        *value = 0.0;
                    }
                }
                if !has_diagonal {
                    return Err(DarcyError::Assembly(format!(
                        "diagonal entry of constrained row {} is not in the sparsity pattern",
                        row_idx
                    )));
                }
                rhs[row_idx] = row_value;
            }
            None => {
                for (&col, value) in columns.iter().zip(values.iter_mut()) {
                    if let Some(col_value) = prescribed[col] {
                        rhs[row_idx] -= *value * col_value;
                        *value = 0.0;
                    }
                }
            }
        }
    }

    debug!("Eliminated {} constrained dofs", boundary_values.len());
    Ok(())
}
