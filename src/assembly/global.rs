//! Global assembly into block CSR systems.
use crate::assembly::local::{ElementConnectivityAssembler, ElementSystemAssembler};
use crate::block::{BlockSizes, BlockSparseMatrix, BlockVector};
use crate::{DarcyError, Result};
use log::{debug, info};
use nalgebra::{DMatrix, DMatrixViewMut, DVector, DVectorViewMut};
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

/// The assembled saddle-point system.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSystem {
    pub matrix: BlockSparseMatrix,
    pub rhs: BlockVector,
}

/// Computes the sparsity pattern of the global matrix.
///
/// The pattern contains every pair of dofs that share an element, plus the full diagonal,
/// so that every row can later be replaced by an identity row.
pub fn assemble_pattern(connectivity: &impl ElementConnectivityAssembler) -> Result<SparsityPattern> {
    let n = connectivity.num_dofs();
    let mut rows: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    let mut element_dofs = Vec::new();

    for element_index in 0..connectivity.num_elements() {
        element_dofs.resize(connectivity.element_dof_count(element_index), 0);
        connectivity.populate_element_dofs(&mut element_dofs, element_index);
        for &row in &element_dofs {
            let columns = rows.get_mut(row).ok_or_else(|| {
                DarcyError::Assembly(format!("dof {} of element {} is out of bounds", row, element_index))
            })?;
            columns.extend_from_slice(&element_dofs);
        }
    }

    let mut offsets = Vec::with_capacity(n + 1);
    let mut indices = Vec::new();
    offsets.push(0);
    for mut columns in rows {
        columns.sort_unstable();
        columns.dedup();
        indices.extend(columns);
        offsets.push(indices.len());
    }

    SparsityPattern::try_from_offsets_and_indices(n, n, offsets, indices)
        .map_err(|err| DarcyError::Assembly(format!("invalid sparsity pattern: {}", err)))
}

/// Adds `value` to entry `(row, col)` of the matrix.
///
/// # Errors
///
/// Returns an assembly error if the entry is not part of the sparsity pattern.
pub fn scatter_add(matrix: &mut CsrMatrix<f64>, row: usize, col: usize, value: f64) -> Result<()> {
    if row >= matrix.nrows() {
        return Err(DarcyError::Assembly(format!("row {} is out of bounds", row)));
    }
    let mut csr_row = matrix.row_mut(row);
    let (columns, values) = csr_row.cols_and_values_mut();
    let idx = columns
        .binary_search(&col)
        .map_err(|_| DarcyError::Assembly(format!("entry ({}, {}) is not in the sparsity pattern", row, col)))?;
    values[idx] += value;
    Ok(())
}

/// Adds an element matrix and load vector to the global system.
///
/// Rows are processed one at a time, walking the (sorted) columns of each CSR row only once.
fn add_element_contribution(
    matrix: &mut CsrMatrix<f64>,
    rhs: &mut DVector<f64>,
    element_dofs: &[usize],
    sorted_permutation: &[usize],
    element_matrix: &DMatrix<f64>,
    element_rhs: &DVector<f64>,
) -> Result<()> {
    for (local_row, &global_row) in element_dofs.iter().enumerate() {
        rhs[global_row] += element_rhs[local_row];

        let mut csr_row = matrix.row_mut(global_row);
        let (columns, values) = csr_row.cols_and_values_mut();
        let mut csr_col_idx_iter = columns.iter().copied().enumerate();
        for &local_col in sorted_permutation {
            let global_col = element_dofs[local_col];
            let (csr_idx, _) = csr_col_idx_iter
                .find(|&(_, col)| col == global_col)
                .ok_or_else(|| {
                    DarcyError::Assembly(format!(
                        "entry ({}, {}) is not in the sparsity pattern",
                        global_row, global_col
                    ))
                })?;
            values[csr_idx] += element_matrix[(local_row, local_col)];
        }
    }
    Ok(())
}

fn sort_permutation(element_dofs: &[usize], permutation: &mut Vec<usize>) {
    permutation.clear();
    permutation.extend(0..element_dofs.len());
    permutation.sort_unstable_by_key(|&i| element_dofs[i]);
}

fn empty_system(pattern: SparsityPattern, block_sizes: BlockSizes) -> Result<(CsrMatrix<f64>, DVector<f64>)> {
    let nnz = pattern.nnz();
    let matrix = CsrMatrix::try_from_pattern_and_values(pattern, vec![0.0; nnz])
        .map_err(|err| DarcyError::Assembly(format!("failed to create CSR matrix: {}", err)))?;
    Ok((matrix, DVector::zeros(block_sizes.total())))
}

/// How element contributions are computed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyStrategy {
    #[default]
    Serial,
    /// Element contributions are computed in parallel with rayon and then added to the
    /// global system in element order. The result is identical to serial assembly.
    Parallel,
}

/// Drives an element assembler over all elements and accumulates the global block system.
#[derive(Debug, Copy, Clone, Default)]
pub struct SystemAssembler {
    strategy: AssemblyStrategy,
}

impl SystemAssembler {
    pub fn with_strategy(strategy: AssemblyStrategy) -> Self {
        Self { strategy }
    }

    pub fn serial() -> Self {
        Self {
            strategy: AssemblyStrategy::Serial,
        }
    }

    pub fn parallel() -> Self {
        Self {
            strategy: AssemblyStrategy::Parallel,
        }
    }

    pub fn strategy(&self) -> AssemblyStrategy {
        self.strategy
    }

    pub fn assemble<A>(&self, element_assembler: &A) -> Result<BlockSystem>
    where
        A: ElementSystemAssembler + Sync,
    {
        let block_sizes = element_assembler.block_sizes();
        if block_sizes.total() != element_assembler.num_dofs() {
            return Err(DarcyError::Assembly(format!(
                "block sizes {}+{} do not add up to {} dofs",
                block_sizes.velocity,
                block_sizes.pressure,
                element_assembler.num_dofs()
            )));
        }

        let pattern = assemble_pattern(element_assembler)?;
        debug!("Sparsity pattern has {} non-zeros", pattern.nnz());
        let (mut matrix, mut rhs) = empty_system(pattern, block_sizes)?;

        match self.strategy {
            AssemblyStrategy::Serial => assemble_serial(element_assembler, &mut matrix, &mut rhs)?,
            AssemblyStrategy::Parallel => assemble_parallel(element_assembler, &mut matrix, &mut rhs)?,
        }
        info!(
            "Assembled system with {} cells ({:?})",
            element_assembler.num_elements(),
            self.strategy
        );

        Ok(BlockSystem {
            matrix: BlockSparseMatrix::from_csr(matrix, block_sizes)?,
            rhs: BlockVector::from_vector(rhs, block_sizes)?,
        })
    }
}

fn assemble_serial<A>(element_assembler: &A, matrix: &mut CsrMatrix<f64>, rhs: &mut DVector<f64>) -> Result<()>
where
    A: ElementSystemAssembler,
{
    let mut workspace = element_assembler.create_workspace();
    let mut element_dofs = Vec::new();
    let mut permutation = Vec::new();
    let mut element_matrix = DMatrix::zeros(0, 0);
    let mut element_rhs = DVector::zeros(0);

    for element_index in 0..element_assembler.num_elements() {
        let n = element_assembler.element_dof_count(element_index);
        element_dofs.resize(n, 0);
        element_assembler.populate_element_dofs(&mut element_dofs, element_index);
        element_matrix.resize_mut(n, n, 0.0);
        element_rhs.resize_vertically_mut(n, 0.0);

        element_assembler.assemble_element_system_into(
            &mut workspace,
            element_index,
            DMatrixViewMut::from(&mut element_matrix),
            DVectorViewMut::from(&mut element_rhs),
        )?;
        sort_permutation(&element_dofs, &mut permutation);
        add_element_contribution(matrix, rhs, &element_dofs, &permutation, &element_matrix, &element_rhs)?;
    }
    Ok(())
}

struct ElementContribution {
    dofs: Vec<usize>,
    matrix: DMatrix<f64>,
    rhs: DVector<f64>,
}

fn assemble_parallel<A>(element_assembler: &A, matrix: &mut CsrMatrix<f64>, rhs: &mut DVector<f64>) -> Result<()>
where
    A: ElementSystemAssembler + Sync,
{
    let contributions: Vec<ElementContribution> = (0..element_assembler.num_elements())
        .into_par_iter()
        .map_init(
            || element_assembler.create_workspace(),
            |workspace, element_index| {
                let n = element_assembler.element_dof_count(element_index);
                let mut dofs = vec![0; n];
                element_assembler.populate_element_dofs(&mut dofs, element_index);
                let mut element_matrix = DMatrix::zeros(n, n);
                let mut element_rhs = DVector::zeros(n);
                element_assembler.assemble_element_system_into(
                    workspace,
                    element_index,
                    DMatrixViewMut::from(&mut element_matrix),
                    DVectorViewMut::from(&mut element_rhs),
                )?;
                Ok(ElementContribution {
                    dofs,
                    matrix: element_matrix,
                    rhs: element_rhs,
                })
            },
        )
        .collect::<Result<_>>()?;

    let mut permutation = Vec::new();
    for contribution in &contributions {
        sort_permutation(&contribution.dofs, &mut permutation);
        add_element_contribution(
            matrix,
            rhs,
            &contribution.dofs,
            &permutation,
            &contribution.matrix,
            &contribution.rhs,
        )?;
    }
    Ok(())
}
