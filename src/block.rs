//! Two-by-two block structure of the velocity/pressure system.
use crate::{DarcyError, Result};
use nalgebra::{DVector, DVectorView, DVectorViewMut};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Sizes of the velocity and pressure blocks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSizes {
    pub velocity: usize,
    pub pressure: usize,
}

/// Index of a block row or column.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Block {
    Velocity,
    Pressure,
}

impl BlockSizes {
    pub fn new(velocity: usize, pressure: usize) -> Self {
        Self { velocity, pressure }
    }

    pub fn total(&self) -> usize {
        self.velocity + self.pressure
    }

    pub fn velocity_range(&self) -> Range<usize> {
        0..self.velocity
    }

    pub fn pressure_range(&self) -> Range<usize> {
        self.velocity..self.total()
    }

    pub fn range(&self, block: Block) -> Range<usize> {
        match block {
            Block::Velocity => self.velocity_range(),
            Block::Pressure => self.pressure_range(),
        }
    }
}

/// Sparse matrix with a 2x2 block structure.
///
/// Rows and columns `0..n_u` belong to the velocity block, the remaining ones to the
/// pressure block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSparseMatrix {
    matrix: CsrMatrix<f64>,
    sizes: BlockSizes,
}

impl BlockSparseMatrix {
    pub fn from_csr(matrix: CsrMatrix<f64>, sizes: BlockSizes) -> Result<Self> {
        if matrix.nrows() != sizes.total() || matrix.ncols() != sizes.total() {
            return Err(DarcyError::Assembly(format!(
                "matrix of size {}x{} does not match block sizes {}+{}",
                matrix.nrows(),
                matrix.ncols(),
                sizes.velocity,
                sizes.pressure
            )));
        }
        Ok(Self { matrix, sizes })
    }

    pub fn block_sizes(&self) -> BlockSizes {
        self.sizes
    }

    pub fn matrix(&self) -> &CsrMatrix<f64> {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut CsrMatrix<f64> {
        &mut self.matrix
    }

    pub fn into_csr(self) -> CsrMatrix<f64> {
        self.matrix
    }

    /// Extracts a single block as a standalone sparse matrix.
    ///
    /// Explicitly stored entries are kept, even if their value is zero.
    pub fn block(&self, row_block: Block, col_block: Block) -> CsrMatrix<f64> {
        let rows = self.sizes.range(row_block);
        let cols = self.sizes.range(col_block);
        let mut coo = CooMatrix::new(rows.len(), cols.len());
        for i in rows.clone() {
            let row = self.matrix.row(i);
            for (&j, &v) in row.col_indices().iter().zip(row.values()) {
                if cols.contains(&j) {
                    coo.push(i - rows.start, j - cols.start, v);
                }
            }
        }
        CsrMatrix::from(&coo)
    }
}

/// Vector with a velocity and a pressure block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockVector {
    data: DVector<f64>,
    sizes: BlockSizes,
}

impl BlockVector {
    pub fn zeros(sizes: BlockSizes) -> Self {
        Self {
            data: DVector::zeros(sizes.total()),
            sizes,
        }
    }

    pub fn from_vector(data: DVector<f64>, sizes: BlockSizes) -> Result<Self> {
        if data.len() != sizes.total() {
            return Err(DarcyError::Assembly(format!(
                "vector of length {} does not match block sizes {}+{}",
                data.len(),
                sizes.velocity,
                sizes.pressure
            )));
        }
        Ok(Self { data, sizes })
    }

    pub fn block_sizes(&self) -> BlockSizes {
        self.sizes
    }

    pub fn as_vector(&self) -> &DVector<f64> {
        &self.data
    }

    pub fn as_vector_mut(&mut self) -> &mut DVector<f64> {
        &mut self.data
    }

    pub fn into_vector(self) -> DVector<f64> {
        self.data
    }

    pub fn velocity(&self) -> DVectorView<f64> {
        self.data.rows(0, self.sizes.velocity)
    }

    pub fn pressure(&self) -> DVectorView<f64> {
        self.data.rows(self.sizes.velocity, self.sizes.pressure)
    }

    pub fn velocity_mut(&mut self) -> DVectorViewMut<f64> {
        self.data.rows_mut(0, self.sizes.velocity)
    }

    pub fn pressure_mut(&mut self) -> DVectorViewMut<f64> {
        self.data.rows_mut(self.sizes.velocity, self.sizes.pressure)
    }
}
