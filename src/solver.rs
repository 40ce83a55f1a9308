//! Direct solvers for the assembled saddle-point system.
//!
//! The system matrix is symmetric but indefinite, so Cholesky-type factorizations do not
//! apply. The default solver is a sparse LU factorization with fill-reducing ordering.
use crate::{DarcyError, Result};
use faer::prelude::Solve;
use faer::sparse::linalg::solvers::Lu;
use faer::sparse::{SparseColMat, Triplet};
use faer::Col;
use log::debug;
use nalgebra::{DMatrix, DVector, Dyn};
use nalgebra_sparse::CsrMatrix;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

pub trait LinearSolver {
    type Factorization;

    /// Factors the given square matrix.
    fn factor(&self, matrix: &CsrMatrix<f64>) -> Result<Self::Factorization>;

    /// Solves the factored system for the given right-hand side.
    fn solve(&self, factorization: &Self::Factorization, rhs: &DVector<f64>) -> Result<DVector<f64>>;

    fn factor_and_solve(&self, matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        let factorization = self.factor(matrix)?;
        self.solve(&factorization, rhs)
    }
}

fn check_square(matrix: &CsrMatrix<f64>) -> Result<()> {
    if matrix.nrows() != matrix.ncols() {
        return Err(DarcyError::Solver(format!(
            "cannot factor a non-square {}x{} matrix",
            matrix.nrows(),
            matrix.ncols()
        )));
    }
    Ok(())
}

fn check_rhs(dim: usize, rhs: &DVector<f64>) -> Result<()> {
    if rhs.len() != dim {
        return Err(DarcyError::Solver(format!(
            "right-hand side has length {}, but the system has dimension {}",
            rhs.len(),
            dim
        )));
    }
    Ok(())
}

fn check_finite(solution: DVector<f64>) -> Result<DVector<f64>> {
    if solution.iter().all(|x| x.is_finite()) {
        Ok(solution)
    } else {
        Err(DarcyError::Solver(
            "solution contains non-finite values, the system is likely singular".to_string(),
        ))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("zero pivot")
}

/// Sparse LU factorization backed by `faer`.
#[derive(Debug, Copy, Clone, Default)]
pub struct SparseLu;

pub struct SparseLuFactorization {
    lu: Lu<usize, f64>,
    dim: usize,
}

impl fmt::Debug for SparseLuFactorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseLuFactorization")
            .field("dim", &self.dim)
            .finish_non_exhaustive()
    }
}

impl LinearSolver for SparseLu {
    type Factorization = SparseLuFactorization;

    fn factor(&self, matrix: &CsrMatrix<f64>) -> Result<Self::Factorization> {
        check_square(matrix)?;
        let n = matrix.nrows();
        let triplets: Vec<_> = matrix
            .triplet_iter()
            .map(|(i, j, &v)| Triplet::new(i, j, v))
            .collect();
        let matrix = SparseColMat::<usize, f64>::try_new_from_triplets(n, n, &triplets)
            .map_err(|err| DarcyError::Solver(format!("failed to convert matrix: {:?}", err)))?;
        // faer panics instead of returning an error when it encounters an exactly zero pivot
        let lu = panic::catch_unwind(AssertUnwindSafe(|| matrix.as_ref().sp_lu()))
            .map_err(|payload| {
                DarcyError::Solver(format!(
                    "sparse LU factorization failed, the matrix is singular: {}",
                    panic_message(payload.as_ref())
                ))
            })?
            .map_err(|err| DarcyError::Solver(format!("sparse LU factorization failed: {:?}", err)))?;
        debug!("Factored {}x{} system with {} non-zeros", n, n, triplets.len());
        Ok(SparseLuFactorization { lu, dim: n })
    }

    fn solve(&self, factorization: &Self::Factorization, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        check_rhs(factorization.dim, rhs)?;
        let b = Col::<f64>::from_fn(rhs.len(), |i| rhs[i]);
        let x = factorization.lu.solve(&b);
        check_finite(DVector::from_iterator(x.nrows(), x.iter().copied()))
    }
}

/// Dense LU factorization with partial pivoting backed by `nalgebra`.
///
/// Only suitable for small systems.
#[derive(Debug, Copy, Clone, Default)]
pub struct DenseLu;

#[derive(Debug, Clone)]
pub struct DenseLuFactorization {
    lu: nalgebra::linalg::LU<f64, Dyn, Dyn>,
    dim: usize,
}

impl LinearSolver for DenseLu {
    type Factorization = DenseLuFactorization;

    fn factor(&self, matrix: &CsrMatrix<f64>) -> Result<Self::Factorization> {
        check_square(matrix)?;
        let lu = DMatrix::from(matrix).lu();
        if !lu.is_invertible() {
            return Err(DarcyError::Solver("dense LU factorization found a zero pivot".to_string()));
        }
        Ok(DenseLuFactorization {
            lu,
            dim: matrix.nrows(),
        })
    }

    fn solve(&self, factorization: &Self::Factorization, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        check_rhs(factorization.dim, rhs)?;
        let solution = factorization
            .lu
            .solve(rhs)
            .ok_or_else(|| DarcyError::Solver("dense LU solve failed".to_string()))?;
        check_finite(solution)
    }
}
