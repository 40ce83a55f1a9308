//! The verification problem on a rectangular channel.
//!
//! Flow is driven by a source term `f = 2 c y` with `c = rho * lambda * k`. The pressure
//! is prescribed weakly on the top boundary, the outward normal flux `-c` strongly on the
//! bottom boundary, and the side walls are impermeable. The analytic solution is
//!
//! ```text
//! u = (0, c (1 - y^2)),    p = -rho (y - y^3 / 3).
//! ```
use crate::assembly::boundary::{apply_boundary_values, extract_boundary_dofs, BoundaryValues};
use crate::assembly::global::{AssemblyStrategy, BlockSystem, SystemAssembler};
use crate::assembly::local::DarcyElementAssembler;
use crate::block::{BlockSizes, BlockVector};
use crate::dof_map::DofMap;
use crate::element::{ComponentMask, MixedElement};
use crate::error::{default_error_quadrature, estimate_l2_error};
use crate::functions::{AnalyticSolution, PermeabilityTensor, PressureBoundaryValue, RightHandSide};
use crate::io::vtk::write_solution_vtk;
use crate::mesh::procedural::create_rectangular_quad_mesh_2d;
use crate::mesh::refinement::refine_uniformly_repeat;
use crate::mesh::{BoundaryId, QuadMesh2d};
use crate::solver::{LinearSolver, SparseLu};
use crate::{DarcyError, Result};
use eyre::WrapErr;
use log::{info, warn};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const TOP: BoundaryId = 1;
pub const BOTTOM: BoundaryId = 2;
pub const SIDE: BoundaryId = 3;

/// Names of the solution components in exported files.
pub const FIELD_NAMES: [&str; 3] = ["u", "v", "p"];

/// Parameters of the verification problem.
///
/// The default is the reference configuration: degree 2 on `[0, pi] x [0, 1]`, starting from
/// 4 x 1 cells refined three times, with unit density, scaling and permeability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DarcyConfig {
    pub degree: usize,
    pub refinement_level: usize,
    pub bottom_left: [f64; 2],
    pub top_right: [f64; 2],
    pub subdivisions: [usize; 2],
    pub density: f64,
    pub lambda: f64,
    pub permeability: f64,
    pub assembly: AssemblyStrategy,
    /// Where the solution is written. Nothing is written if `None`.
    pub output_path: Option<PathBuf>,
}

impl Default for DarcyConfig {
    fn default() -> Self {
        Self {
            degree: 2,
            refinement_level: 3,
            bottom_left: [0.0, 0.0],
            top_right: [std::f64::consts::PI, 1.0],
            subdivisions: [4, 1],
            density: 1.0,
            lambda: 1.0,
            permeability: 1.0,
            assembly: AssemblyStrategy::Serial,
            output_path: Some(PathBuf::from("solution.vtk")),
        }
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(DarcyError::Configuration(format!(
            "{} must be positive and finite, got {}",
            name, value
        )))
    }
}

impl DarcyConfig {
    /// Checks that the configuration describes a well-posed problem.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for empty or inverted domains, zero subdivisions, cell
    /// counts that overflow and non-positive material parameters.
    pub fn validate(&self) -> Result<()> {
        for d in 0..2 {
            let (a, b) = (self.bottom_left[d], self.top_right[d]);
            if !(a.is_finite() && b.is_finite() && a < b) {
                return Err(DarcyError::Configuration(format!(
                    "domain [{:?}, {:?}] is empty or inverted",
                    self.bottom_left, self.top_right
                )));
            }
        }
        if self.subdivisions.contains(&0) {
            return Err(DarcyError::Configuration(format!(
                "subdivisions must be positive, got {:?}",
                self.subdivisions
            )));
        }
        if self.checked_num_total_cells().is_none() {
            return Err(DarcyError::Configuration(format!(
                "refinement level {} of {:?} cells exceeds the representable number of cells",
                self.refinement_level, self.subdivisions
            )));
        }
        check_positive("density", self.density)?;
        check_positive("lambda", self.lambda)?;
        check_positive("permeability", self.permeability)?;
        Ok(())
    }

    /// The flux scale `c = rho * lambda * k`, i.e. the peak velocity of the analytic solution.
    pub fn flux_scale(&self) -> f64 {
        self.density * self.lambda * self.permeability
    }

    pub fn num_coarse_cells(&self) -> usize {
        self.subdivisions[0].saturating_mul(self.subdivisions[1])
    }

    /// Number of cells after refinement, saturating at `usize::MAX`.
    pub fn num_active_cells(&self) -> usize {
        self.checked_num_cells_on_level(self.refinement_level)
            .unwrap_or(usize::MAX)
    }

    /// Number of cells in the whole refinement hierarchy, including the coarse cells.
    ///
    /// Saturates at `usize::MAX`.
    pub fn num_total_cells(&self) -> usize {
        self.checked_num_total_cells().unwrap_or(usize::MAX)
    }

    fn checked_num_cells_on_level(&self, level: usize) -> Option<usize> {
        let level = u32::try_from(level).ok()?;
        self.subdivisions[0]
            .checked_mul(self.subdivisions[1])?
            .checked_mul(4usize.checked_pow(level)?)
    }

    fn checked_num_total_cells(&self) -> Option<usize> {
        (0..=self.refinement_level).try_fold(0usize, |total, level| {
            total.checked_add(self.checked_num_cells_on_level(level)?)
        })
    }

    pub fn analytic_solution(&self) -> AnalyticSolution {
        AnalyticSolution {
            density: self.density,
            flux_scale: self.flux_scale(),
        }
    }
}

/// Creates the coarse rectangular mesh, tags its boundary faces and refines it.
///
/// Faces at the top and bottom of the rectangle are tagged `TOP` and `BOTTOM`, all other
/// boundary faces `SIDE`. Tags are assigned before refinement and inherited by child faces.
pub fn make_grid(config: &DarcyConfig) -> QuadMesh2d<f64> {
    let bottom_left = Point2::from(config.bottom_left);
    let top_right = Point2::from(config.top_right);
    let mut mesh = create_rectangular_quad_mesh_2d(&bottom_left, &top_right, config.subdivisions);

    let tolerance = 1e-10 * (top_right - bottom_left).norm();
    mesh.tag_boundary_faces(|centroid| {
        if (centroid.y - top_right.y).abs() < tolerance {
            Some(TOP)
        } else if (centroid.y - bottom_left.y).abs() < tolerance {
            Some(BOTTOM)
        } else {
            Some(SIDE)
        }
    });

    refine_uniformly_repeat(&mesh, config.refinement_level)
}

/// $L^2$ errors of the two solution fields.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorNorms {
    pub pressure: f64,
    pub velocity: f64,
}

/// Everything a run reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub degree: usize,
    pub refinement_level: usize,
    pub num_active_cells: usize,
    pub num_total_cells: usize,
    pub block_sizes: BlockSizes,
    pub errors: ErrorNorms,
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solving problem in 2 space dimensions.")?;
        writeln!(f, "   Degree: {}", self.degree)?;
        writeln!(f, "   Refinement level: {}", self.refinement_level)?;
        writeln!(f, "   Number of active cells: {}", self.num_active_cells)?;
        writeln!(f, "   Total number of cells: {}", self.num_total_cells)?;
        writeln!(
            f,
            "   Number of degrees of freedom: {} ({}+{})",
            self.block_sizes.total(),
            self.block_sizes.velocity,
            self.block_sizes.pressure
        )?;
        write!(
            f,
            "Errors: ||e_p||_L2 = {:e}, ||e_u||_L2 = {:e}",
            self.errors.pressure, self.errors.velocity
        )
    }
}

/// The discretized verification problem: mesh, element and dof map.
#[derive(Debug, Clone)]
pub struct DarcyProblem {
    config: DarcyConfig,
    element: MixedElement,
    mesh: QuadMesh2d<f64>,
    dof_map: DofMap,
}

impl DarcyProblem {
    /// Validates the configuration, builds the mesh and enumerates the dofs.
    pub fn setup(config: DarcyConfig) -> Result<Self> {
        config.validate()?;
        let element = MixedElement::try_new(config.degree, 2)?;
        let mesh = make_grid(&config);
        let dof_map = DofMap::assign(&mesh, &element)?;

        info!(
            "Set up RT_{} x DGQ_{} problem on {} cells with {} dofs",
            config.degree,
            config.degree,
            mesh.connectivity().len(),
            dof_map.n_dofs()
        );
        Ok(Self {
            config,
            element,
            mesh,
            dof_map,
        })
    }

    pub fn config(&self) -> &DarcyConfig {
        &self.config
    }

    pub fn element(&self) -> &MixedElement {
        &self.element
    }

    pub fn mesh(&self) -> &QuadMesh2d<f64> {
        &self.mesh
    }

    pub fn dof_map(&self) -> &DofMap {
        &self.dof_map
    }

    /// Assembles the saddle-point system, including the weakly imposed top pressure.
    pub fn assemble_system(&self) -> Result<BlockSystem> {
        self.assemble_system_with(SystemAssembler::with_strategy(self.config.assembly))
    }

    pub fn assemble_system_with(&self, assembler: SystemAssembler) -> Result<BlockSystem> {
        let k_inverse = PermeabilityTensor::isotropic(self.config.permeability).try_inverse()?;
        let element_assembler = DarcyElementAssembler::new(
            &self.mesh,
            &self.dof_map,
            &self.element,
            RightHandSide {
                flux_scale: self.config.flux_scale(),
            },
            k_inverse,
            PressureBoundaryValue {
                density: self.config.density,
            },
            TOP,
        )
        .with_lambda(self.config.lambda);

        if element_assembler.num_weak_faces() == 0 {
            warn!("No faces are tagged for the weak pressure condition, the pressure is only determined up to a constant");
        }
        assembler.assemble(&element_assembler)
    }

    /// Collects the strongly imposed flux values: zero flux through the side walls and the
    /// outward flux `-c` through the bottom.
    pub fn boundary_values(&self) -> Result<BoundaryValues> {
        let mut values = BoundaryValues::new();

        let flux_mask = ComponentMask::pressure(2).complement();
        let side_dofs = extract_boundary_dofs(&self.mesh, &self.dof_map, &self.element, &flux_mask, &[SIDE])?;
        values.insert_all(&side_dofs, 0.0)?;

        let velocity_mask = ComponentMask::velocity(2);
        let bottom_dofs =
            extract_boundary_dofs(&self.mesh, &self.dof_map, &self.element, &velocity_mask, &[BOTTOM])?;
        values.insert_all(&bottom_dofs, -self.config.flux_scale())?;

        info!(
            "Constrained {} side and {} bottom flux dofs",
            side_dofs.len(),
            bottom_dofs.len()
        );
        Ok(values)
    }

    pub fn apply_boundary_conditions(&self, system: &mut BlockSystem) -> Result<()> {
        let values = self.boundary_values()?;
        apply_boundary_values(&values, system.matrix.matrix_mut(), system.rhs.as_vector_mut())
    }

    pub fn solve(&self, system: &BlockSystem) -> Result<BlockVector> {
        self.solve_with(&SparseLu, system)
    }

    pub fn solve_with<S: LinearSolver>(&self, solver: &S, system: &BlockSystem) -> Result<BlockVector> {
        let solution = solver.factor_and_solve(system.matrix.matrix(), system.rhs.as_vector())?;
        BlockVector::from_vector(solution, system.rhs.block_sizes())
    }

    /// Computes the $L^2$ errors of pressure and velocity against the analytic solution.
    pub fn compute_errors(&self, solution: &BlockVector) -> Result<ErrorNorms> {
        let analytic = self.config.analytic_solution();
        let quadrature = default_error_quadrature(&self.element);
        let error = |mask: &ComponentMask| {
            estimate_l2_error(
                &self.mesh,
                &self.dof_map,
                &self.element,
                solution.as_vector(),
                &analytic,
                &quadrature,
                mask,
            )
        };
        Ok(ErrorNorms {
            pressure: error(&ComponentMask::pressure(2))?,
            velocity: error(&ComponentMask::velocity(2))?,
        })
    }

    pub fn output_results(&self, solution: &BlockVector, path: impl AsRef<Path>) -> eyre::Result<()> {
        write_solution_vtk(
            &self.mesh,
            &self.dof_map,
            &self.element,
            solution.as_vector(),
            &FIELD_NAMES,
            path,
        )
    }

    /// Runs the whole pipeline and returns the solution along with the run summary.
    pub fn run(&self) -> eyre::Result<(BlockVector, RunSummary)> {
        let mut system = self.assemble_system().wrap_err("failed to assemble system")?;
        self.apply_boundary_conditions(&mut system)
            .wrap_err("failed to apply boundary conditions")?;
        let solution = self.solve(&system).wrap_err("failed to solve system")?;
        let errors = self
            .compute_errors(&solution)
            .wrap_err("failed to compute errors")?;
        info!(
            "Errors: pressure {:e}, velocity {:e}",
            errors.pressure, errors.velocity
        );

        if let Some(path) = &self.config.output_path {
            self.output_results(&solution, path)?;
        }

        let summary = RunSummary {
            degree: self.config.degree,
            refinement_level: self.config.refinement_level,
            num_active_cells: self.mesh.connectivity().len(),
            num_total_cells: self.config.num_total_cells(),
            block_sizes: self.dof_map.block_sizes(),
            errors,
        };
        Ok((solution, summary))
    }
}

/// Sets up and runs the problem described by `config`.
pub fn run(config: DarcyConfig) -> eyre::Result<RunSummary> {
    let problem = DarcyProblem::setup(config).wrap_err("failed to set up problem")?;
    let (_, summary) = problem.run()?;
    Ok(summary)
}
