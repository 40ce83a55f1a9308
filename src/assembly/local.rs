//! Element-local assembly of the mixed Darcy system.
use crate::block::BlockSizes;
use crate::connectivity::CellConnectivity;
use crate::dof_map::DofMap;
use crate::element::MixedElement;
use crate::functions::PointwiseField;
use crate::mesh::{BoundaryId, QuadMesh2d};
use crate::quadrature::tensor::quadrilateral_gauss;
use crate::quadrature::univariate::gauss;
use crate::quadrature::{QuadraturePair1d, QuadraturePair2d};
use crate::{DarcyError, Result};
use nalgebra::{DMatrixViewMut, DVectorViewMut, Matrix2};

mod values;

pub use values::*;

pub trait ElementConnectivityAssembler {
    fn num_elements(&self) -> usize;

    fn num_dofs(&self) -> usize;

    fn element_dof_count(&self, element_index: usize) -> usize;

    fn populate_element_dofs(&self, output: &mut [usize], element_index: usize);
}

impl ElementConnectivityAssembler for DofMap {
    fn num_elements(&self) -> usize {
        self.n_cells()
    }

    fn num_dofs(&self) -> usize {
        self.n_dofs()
    }

    fn element_dof_count(&self, _element_index: usize) -> usize {
        self.dofs_per_cell()
    }

    fn populate_element_dofs(&self, output: &mut [usize], element_index: usize) {
        output.copy_from_slice(self.cell_dofs(element_index));
    }
}

/// Assembles element matrices and load vectors of a block system.
pub trait ElementSystemAssembler: ElementConnectivityAssembler {
    /// Scratch data reused between elements.
    type Workspace;

    fn create_workspace(&self) -> Self::Workspace;

    fn block_sizes(&self) -> BlockSizes;

    /// Computes the element matrix and load vector of element `element_index`.
    ///
    /// The outputs must be square with size [`element_dof_count`] and are overwritten.
    ///
    /// [`element_dof_count`]: ElementConnectivityAssembler::element_dof_count
    fn assemble_element_system_into(
        &self,
        workspace: &mut Self::Workspace,
        element_index: usize,
        matrix: DMatrixViewMut<f64>,
        rhs: DVectorViewMut<f64>,
    ) -> Result<()>;
}

/// Workspace for [`DarcyElementAssembler`].
#[derive(Debug, Clone)]
pub struct DarcyElementWorkspace {
    cell_values: CellValues,
    face_values: FaceValues,
    source_values: Vec<f64>,
    k_inverse_values: Vec<Matrix2<f64>>,
    trace_values: Vec<f64>,
}

/// Element assembler for the dual mixed Darcy formulation
///
/// ```text
/// (1/lambda) (K^{-1} u, v) - (p, div v) - (div u, q) = (f, q) - <g, v.n>
/// ```
///
/// where the pressure trace `g` is imposed weakly on the faces with a given boundary id.
/// The inverse permeability need not be symmetric. The velocity mass block is exactly
/// symmetric on cells where all evaluated tensors are.
#[derive(Debug, Clone)]
pub struct DarcyElementAssembler<'a, Source, KInverse, Trace> {
    mesh: &'a QuadMesh2d<f64>,
    dof_map: &'a DofMap,
    element: &'a MixedElement,
    source: Source,
    k_inverse: KInverse,
    pressure_trace: Trace,
    lambda: f64,
    quadrature: QuadraturePair2d,
    face_quadrature: QuadraturePair1d,
    weak_faces: Vec<[bool; 4]>,
}

impl<'a, Source, KInverse, Trace> DarcyElementAssembler<'a, Source, KInverse, Trace>
where
    Source: PointwiseField<Value = f64>,
    KInverse: PointwiseField<Value = Matrix2<f64>>,
    Trace: PointwiseField<Value = f64>,
{
    /// Creates an assembler with the default quadrature (`k + 2` Gauss points per direction)
    /// and `lambda = 1`.
    ///
    /// The pressure trace is imposed on the faces tagged with `weak_pressure_boundary`.
    pub fn new(
        mesh: &'a QuadMesh2d<f64>,
        dof_map: &'a DofMap,
        element: &'a MixedElement,
        source: Source,
        k_inverse: KInverse,
        pressure_trace: Trace,
        weak_pressure_boundary: BoundaryId,
    ) -> Self {
        let n = element.degree() + 2;
        let mut weak_faces = vec![[false; 4]; mesh.connectivity().len()];
        for (_, cell, face, id) in mesh.find_boundary_faces_with_ids() {
            if id == weak_pressure_boundary {
                weak_faces[cell][face] = true;
            }
        }
        Self {
            mesh,
            dof_map,
            element,
            source,
            k_inverse,
            pressure_trace,
            lambda: 1.0,
            quadrature: quadrilateral_gauss(n),
            face_quadrature: gauss(n),
            weak_faces,
        }
    }

    /// Sets the scaling `lambda` of the velocity mass term.
    pub fn with_lambda(self, lambda: f64) -> Self {
        Self { lambda, ..self }
    }

    /// Uses `num_points` Gauss points per direction on cells and faces.
    ///
    /// # Errors
    ///
    /// Returns a configuration error unless the rule is exact for polynomials of degree
    /// `2 k + 2`, which requires at least `k + 2` points.
    pub fn with_quadrature_points_per_dim(self, num_points: usize) -> Result<Self> {
        let required = self.element.degree() + 2;
        if num_points < required {
            return Err(DarcyError::Configuration(format!(
                "{} quadrature points per direction are not enough for degree {}, at least {} are required",
                num_points,
                self.element.degree(),
                required
            )));
        }
        Ok(Self {
            quadrature: quadrilateral_gauss(num_points),
            face_quadrature: gauss(num_points),
            ..self
        })
    }

    pub fn num_weak_faces(&self) -> usize {
        self.weak_faces
            .iter()
            .map(|faces| faces.iter().filter(|&&weak| weak).count())
            .sum()
    }
}

impl<'a, Source, KInverse, Trace> ElementConnectivityAssembler for DarcyElementAssembler<'a, Source, KInverse, Trace> {
    fn num_elements(&self) -> usize {
        self.dof_map.num_elements()
    }

    fn num_dofs(&self) -> usize {
        self.dof_map.num_dofs()
    }

    fn element_dof_count(&self, element_index: usize) -> usize {
        self.dof_map.element_dof_count(element_index)
    }

    fn populate_element_dofs(&self, output: &mut [usize], element_index: usize) {
        self.dof_map.populate_element_dofs(output, element_index)
    }
}

impl<'a, Source, KInverse, Trace> ElementSystemAssembler for DarcyElementAssembler<'a, Source, KInverse, Trace>
where
    Source: PointwiseField<Value = f64>,
    KInverse: PointwiseField<Value = Matrix2<f64>>,
    Trace: PointwiseField<Value = f64>,
{
    type Workspace = DarcyElementWorkspace;

    fn create_workspace(&self) -> Self::Workspace {
        DarcyElementWorkspace {
            cell_values: CellValues::new(self.element, &self.quadrature),
            face_values: FaceValues::new(self.element, &self.face_quadrature),
            source_values: Vec::new(),
            k_inverse_values: Vec::new(),
            trace_values: Vec::new(),
        }
    }

    fn block_sizes(&self) -> BlockSizes {
        self.dof_map.block_sizes()
    }

    fn assemble_element_system_into(
        &self,
        workspace: &mut Self::Workspace,
        element_index: usize,
        mut matrix: DMatrixViewMut<f64>,
        mut rhs: DVectorViewMut<f64>,
    ) -> Result<()> {
        let n = self.element.n_dofs();
        let n_u = self.element.n_velocity_dofs();
        if matrix.nrows() != n || matrix.ncols() != n || rhs.len() != n {
            return Err(DarcyError::Assembly(format!(
                "element output has size {}x{} and {}, expected {}",
                matrix.nrows(),
                matrix.ncols(),
                rhs.len(),
                n
            )));
        }

        let cell = self
            .mesh
            .connectivity()
            .get(element_index)
            .and_then(|conn| conn.cell(self.mesh.vertices()))
            .ok_or_else(|| DarcyError::Assembly(format!("cell {} is not part of the mesh", element_index)))?;
        let orientations = self.dof_map.cell_orientations(element_index);

        let DarcyElementWorkspace {
            cell_values,
            face_values,
            source_values,
            k_inverse_values,
            trace_values,
        } = workspace;

        cell_values.reinit(&cell, orientations)?;
        let n_q = cell_values.n_quadrature_points();
        source_values.resize(n_q, 0.0);
        k_inverse_values.resize(n_q, Matrix2::zeros());
        self.source
            .value_list(cell_values.quadrature_points(), source_values)?;
        self.k_inverse
            .value_list(cell_values.quadrature_points(), k_inverse_values)?;

        matrix.fill(0.0);
        rhs.fill(0.0);

        // With a symmetric coefficient only the upper triangle of the velocity mass block is
        // integrated and then mirrored, which keeps the block exactly symmetric
        let symmetric_coefficient = k_inverse_values
            .iter()
            .all(|k_inverse| *k_inverse == k_inverse.transpose());

        for q in 0..n_q {
            let jxw = cell_values.jxw(q);
            let k_inverse = k_inverse_values[q] / self.lambda;

            for i in 0..n_u {
                // Row i tests with phi_i, so the entry is phi_i . (K^{-1} phi_j)
                let k_inverse_t_phi_i = k_inverse.transpose() * cell_values.velocity(i, q);
                let first_column = if symmetric_coefficient { i } else { 0 };
                for j in first_column..n_u {
                    matrix[(i, j)] += k_inverse_t_phi_i.dot(cell_values.velocity(j, q)) * jxw;
                }

                let div_i = cell_values.divergence(i, q);
                for j in n_u..n {
                    let b = -div_i * cell_values.pressure(j, q) * jxw;
                    matrix[(i, j)] += b;
                    matrix[(j, i)] += b;
                }
            }

            for i in n_u..n {
                rhs[i] += cell_values.pressure(i, q) * source_values[q] * jxw;
            }
        }

        if symmetric_coefficient {
            for i in 0..n_u {
                for j in 0..i {
                    matrix[(i, j)] = matrix[(j, i)];
                }
            }
        }

        for face in 0..self.element.faces_per_cell() {
            if !self.weak_faces[element_index][face] {
                continue;
            }
            face_values.reinit(&cell, face, orientations)?;
            let n_fq = face_values.n_quadrature_points();
            trace_values.resize(n_fq, 0.0);
            self.pressure_trace
                .value_list(face_values.quadrature_points(), trace_values)?;
            for q in 0..n_fq {
                let weight = trace_values[q] * face_values.jxw(q);
                let normal = face_values.normal(q);
                for i in 0..n_u {
                    rhs[i] -= face_values.velocity(i, q).dot(normal) * weight;
                }
            }
        }

        Ok(())
    }
}
