//! Mixed finite element solver for steady Darcy flow.
//!
//! The velocity is discretized with Raviart-Thomas elements and the pressure with
//! discontinuous tensor-product Lagrange elements on quadrilateral meshes. The resulting
//! saddle-point system is assembled into a 2x2 block sparse matrix, solved with a sparse
//! direct solver, and the discrete solution can be compared against an analytic solution in
//! the L2 norm.
use std::fmt;
use std::fmt::{Display, Formatter};

pub mod assembly;
pub mod block;
pub mod connectivity;
pub mod dof_map;
pub mod element;
pub mod error;
pub mod functions;
pub mod io;
pub mod mesh;
pub mod problem;
pub mod quadrature;
pub mod solver;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
pub extern crate vtkio;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DarcyError {
    /// The problem is set up inconsistently, e.g. mesh and element dimensions disagree or
    /// boundary values are prescribed twice with different values.
    Configuration(String),
    /// Evaluation during assembly produced inconsistent data.
    Assembly(String),
    /// The linear solver failed to factor or solve the system.
    Solver(String),
}

impl Display for DarcyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {}", msg),
            Self::Assembly(msg) => write!(f, "assembly error: {}", msg),
            Self::Solver(msg) => write!(f, "solver error: {}", msg),
        }
    }
}

impl std::error::Error for DarcyError {}

pub type Result<T> = std::result::Result<T, DarcyError>;
