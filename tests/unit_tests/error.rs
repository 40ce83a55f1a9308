use crate::coarse_channel_mesh;
use darcy::dof_map::DofMap;
use darcy::element::{ComponentMask, MixedElement, REFERENCE_FACE_OUTWARD_SIGNS};
use darcy::error::{default_error_quadrature, estimate_cellwise_l2_error, estimate_l2_error};
use darcy::functions::FnField;
use darcy::mesh::refinement::refine_uniformly;
use darcy::mesh::QuadMesh2d;
use darcy::quadrature::Quadrature;
use darcy::DarcyError;
use matrixcompare::assert_scalar_eq;
use nalgebra::{DVector, Point2, Vector2, Vector3};
use std::f64::consts::PI;

fn setup(degree: usize) -> (QuadMesh2d<f64>, MixedElement, DofMap) {
    let mesh = refine_uniformly(&coarse_channel_mesh());
    let element = MixedElement::new(degree);
    let dof_map = DofMap::assign(&mesh, &element).unwrap();
    (mesh, element, dof_map)
}

#[test]
fn default_error_quadrature_is_iterated_trapezoid() {
    for k in 0..3 {
        let quadrature = default_error_quadrature(&MixedElement::new(k));
        assert_eq!(quadrature.num_points(), (k + 3) * (k + 3));
        assert_scalar_eq!(quadrature.weights().iter().sum::<f64>(), 4.0, comp = abs, tol = 1e-14);
        // Includes the corners of the reference cell
        assert!(quadrature.points().contains(&Point2::new(-1.0, -1.0)));
        assert!(quadrature.points().contains(&Point2::new(1.0, 1.0)));
    }
}

#[test]
fn constant_pressure_error() {
    let (mesh, element, dof_map) = setup(1);
    let quadrature = default_error_quadrature(&element);
    let mut solution: DVector<f64> = DVector::zeros(dof_map.n_dofs());
    // The pressure basis is a partition of unity
    solution.rows_mut(dof_map.velocity_range().end, dof_map.pressure_range().len()).fill(1.0);

    let one = FnField(|_: &Point2<f64>| Vector3::new(0.0, 0.0, 1.0));
    let zero = FnField(|_: &Point2<f64>| Vector3::zeros());
    let pressure = ComponentMask::pressure(2);
    let velocity = ComponentMask::velocity(2);

    let e = estimate_l2_error(&mesh, &dof_map, &element, &solution, &one, &quadrature, &pressure).unwrap();
    assert_scalar_eq!(e, 0.0, comp = abs, tol = 1e-13);
    let e = estimate_l2_error(&mesh, &dof_map, &element, &solution, &one, &quadrature, &velocity).unwrap();
    assert_eq!(e, 0.0);

    // The error against zero is the square root of the area
    let cellwise = estimate_cellwise_l2_error(&mesh, &dof_map, &element, &solution, &zero, &quadrature, &pressure).unwrap();
    assert_eq!(cellwise.len(), 16);
    for e in cellwise.iter() {
        assert_scalar_eq!(*e, (PI / 16.0).sqrt(), comp = abs, tol = 1e-13);
    }
    assert_scalar_eq!(cellwise.norm(), PI.sqrt(), comp = abs, tol = 1e-13);

    // Both masks together measure all components
    let all = ComponentMask::new(vec![true, true, true]);
    let e = estimate_l2_error(&mesh, &dof_map, &element, &solution, &zero, &quadrature, &all).unwrap();
    assert_scalar_eq!(e, PI.sqrt(), comp = abs, tol = 1e-13);
}

#[test]
fn constant_velocity_is_reproduced_by_lowest_order_fluxes() {
    let (mesh, element, dof_map) = setup(0);
    let u = Vector2::new(0.3, -1.2);

    let mut solution: DVector<f64> = DVector::zeros(dof_map.n_dofs());
    let mut assigned = vec![false; dof_map.n_dofs()];
    for cell_idx in 0..dof_map.n_cells() {
        let cell = mesh.get_cell(cell_idx).unwrap();
        for face in 0..4 {
            let tangent = cell.face_tangent(face, 0.0);
            let outward_normal = Vector2::new(tangent.y, -tangent.x).normalize();
            let dof = dof_map.cell_dofs(cell_idx)[face];
            let orientation = dof_map.cell_orientations(cell_idx)[face];
            let value = u.dot(&outward_normal) * orientation * REFERENCE_FACE_OUTWARD_SIGNS[face];
            if assigned[dof] {
                // Both cells adjacent to a face must agree on the global flux
                assert_scalar_eq!(solution[dof], value, comp = abs, tol = 1e-14);
            }
            solution[dof] = value;
            assigned[dof] = true;
        }
    }

    let exact = FnField(move |_: &Point2<f64>| Vector3::new(u.x, u.y, 0.0));
    let quadrature = default_error_quadrature(&element);
    let e = estimate_l2_error(
        &mesh,
        &dof_map,
        &element,
        &solution,
        &exact,
        &quadrature,
        &ComponentMask::velocity(2),
    )
    .unwrap();
    assert_scalar_eq!(e, 0.0, comp = abs, tol = 1e-13);
}

#[test]
fn error_estimation_rejects_inconsistent_input() {
    let (mesh, element, dof_map) = setup(0);
    let quadrature = default_error_quadrature(&element);
    let zero = FnField(|_: &Point2<f64>| Vector3::zeros());

    let solution = DVector::zeros(dof_map.n_dofs());
    let short_mask = ComponentMask::new(vec![true, false]);
    let result = estimate_l2_error(&mesh, &dof_map, &element, &solution, &zero, &quadrature, &short_mask);
    assert!(matches!(result, Err(DarcyError::Configuration(_))));

    let short_solution = DVector::zeros(dof_map.n_dofs() - 1);
    let result = estimate_cellwise_l2_error(
        &mesh,
        &dof_map,
        &element,
        &short_solution,
        &zero,
        &quadrature,
        &ComponentMask::pressure(2),
    );
    assert!(matches!(result, Err(DarcyError::Assembly(_))));
}
