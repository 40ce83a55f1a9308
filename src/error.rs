//! Functionality for error estimation.
use crate::assembly::local::CellValues;
use crate::connectivity::CellConnectivity;
use crate::dof_map::DofMap;
use crate::element::{ComponentMask, MixedElement};
use crate::functions::PointwiseField;
use crate::mesh::QuadMesh2d;
use crate::quadrature::tensor::quadrilateral_iterated_trapezoid;
use crate::quadrature::QuadraturePair2d;
use crate::{DarcyError, Result};
use nalgebra::{DVector, Vector3};

/// The quadrature used for error evaluation: the iterated trapezoidal rule with `k + 2`
/// subintervals per direction.
pub fn default_error_quadrature(element: &MixedElement) -> QuadraturePair2d {
    quadrilateral_iterated_trapezoid(element.degree() + 2)
}

/// Estimate the squared $L^2$ error $\norm{u_h - u}^2_{L^2}$ of the masked components on a single
/// cell, given the cell values already initialized on that cell and the local coefficients of
/// the discrete solution.
pub fn estimate_element_l2_error_squared(
    cell_values: &CellValues,
    coefficients: &[f64],
    u: &impl PointwiseField<Value = Vector3<f64>>,
    mask: &ComponentMask,
    u_h_buffer: &mut Vec<Vector3<f64>>,
) -> Result<f64> {
    let n_q = cell_values.n_quadrature_points();
    u_h_buffer.resize(n_q, Vector3::zeros());
    cell_values.solution_values(coefficients, u_h_buffer)?;

    let mut result = 0.0;
    for (q, u_h) in u_h_buffer.iter().enumerate() {
        let u_at_x = u.value(cell_values.quadrature_point(q));
        let error = u_h - u_at_x;
        let masked_error_squared: f64 = (0..3)
            .filter(|&c| mask.is_selected(c))
            .map(|c| error[c] * error[c])
            .sum();
        result += cell_values.jxw(q) * masked_error_squared;
    }
    Ok(result)
}

/// Estimates the $L^2$ error of the masked components on every cell.
///
/// # Errors
///
/// Returns a configuration error if the mask does not match the element, and an assembly
/// error if the solution vector does not match the dof map or a cell is degenerate.
pub fn estimate_cellwise_l2_error(
    mesh: &QuadMesh2d<f64>,
    dof_map: &DofMap,
    element: &MixedElement,
    solution: &DVector<f64>,
    u: &impl PointwiseField<Value = Vector3<f64>>,
    quadrature: &QuadraturePair2d,
    mask: &ComponentMask,
) -> Result<DVector<f64>> {
    if mask.len() != element.n_components() {
        return Err(DarcyError::Configuration(format!(
            "component mask has {} entries, but the element has {} components",
            mask.len(),
            element.n_components()
        )));
    }
    if solution.len() != dof_map.n_dofs() {
        return Err(DarcyError::Assembly(format!(
            "solution has {} entries, but there are {} dofs",
            solution.len(),
            dof_map.n_dofs()
        )));
    }

    let mut cell_values = CellValues::new(element, quadrature);
    let mut coefficients = vec![0.0; element.n_dofs()];
    let mut u_h_buffer = Vec::new();
    let mut errors = DVector::zeros(dof_map.n_cells());

    for (cell_idx, conn) in mesh.connectivity().iter().enumerate() {
        let cell = conn
            .cell(mesh.vertices())
            .ok_or_else(|| DarcyError::Assembly(format!("cell {} references missing vertices", cell_idx)))?;
        cell_values.reinit(&cell, dof_map.cell_orientations(cell_idx))?;
        for (c, &dof) in coefficients.iter_mut().zip(dof_map.cell_dofs(cell_idx)) {
            *c = solution[dof];
        }
        let error_squared =
            estimate_element_l2_error_squared(&cell_values, &coefficients, u, mask, &mut u_h_buffer)?;
        errors[cell_idx] = error_squared.max(0.0).sqrt();
    }
    Ok(errors)
}

/// Estimates the global $L^2$ error of the masked components, i.e. the Euclidean norm of the
/// cellwise errors.
pub fn estimate_l2_error(
    mesh: &QuadMesh2d<f64>,
    dof_map: &DofMap,
    element: &MixedElement,
    solution: &DVector<f64>,
    u: &impl PointwiseField<Value = Vector3<f64>>,
    quadrature: &QuadraturePair2d,
    mask: &ComponentMask,
) -> Result<f64> {
    let cellwise = estimate_cellwise_l2_error(mesh, dof_map, element, solution, u, quadrature, mask)?;
    Ok(cellwise.norm())
}
