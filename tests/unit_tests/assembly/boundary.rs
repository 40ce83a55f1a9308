use darcy::assembly::boundary::{apply_boundary_values, extract_boundary_dofs, BoundaryValues};
use darcy::dof_map::DofMap;
use darcy::element::{ComponentMask, MixedElement};
use darcy::nalgebra_sparse::CsrMatrix;
use darcy::problem::{make_grid, DarcyConfig, BOTTOM, SIDE, TOP};
use darcy::DarcyError;
use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector};
use util::max_asymmetry;

fn tridiagonal_system() -> (CsrMatrix<f64>, DVector<f64>) {
    #[rustfmt::skip]
    let matrix = CsrMatrix::try_from_csr_data(
        3, 3,
        vec![0, 2, 5, 7],
        vec![0, 1, 0, 1, 2, 1, 2],
        vec![4.0, 1.0, 1.0, 3.0, 2.0, 2.0, 5.0],
    )
    .unwrap();
    (matrix, DVector::from_column_slice(&[1.0, 2.0, 3.0]))
}

#[test]
fn boundary_dofs_of_coarse_channel() {
    let config = DarcyConfig {
        degree: 1,
        refinement_level: 0,
        ..DarcyConfig::default()
    };
    let mesh = make_grid(&config);
    let element = MixedElement::new(1);
    let dof_map = DofMap::assign(&mesh, &element).unwrap();
    let velocity = ComponentMask::velocity(2);
    let pressure = ComponentMask::pressure(2);

    let side = extract_boundary_dofs(&mesh, &dof_map, &element, &velocity, &[SIDE]).unwrap();
    let bottom = extract_boundary_dofs(&mesh, &dof_map, &element, &velocity, &[BOTTOM]).unwrap();
    let top = extract_boundary_dofs(&mesh, &dof_map, &element, &velocity, &[TOP]).unwrap();
    assert_eq!(side.len(), 2 * 2);
    assert_eq!(bottom.len(), 4 * 2);
    assert_eq!(top.len(), 4 * 2);
    assert!(side.windows(2).all(|w| w[0] < w[1]));

    let all = extract_boundary_dofs(&mesh, &dof_map, &element, &velocity, &[TOP, BOTTOM, SIDE]).unwrap();
    assert_eq!(all.len(), side.len() + bottom.len() + top.len());

    // The flux variable is everything except the pressure
    let flux = extract_boundary_dofs(&mesh, &dof_map, &element, &pressure.complement(), &[SIDE]).unwrap();
    assert_eq!(flux, side);

    // Pressure dofs never lie on faces
    let pressure_dofs = extract_boundary_dofs(&mesh, &dof_map, &element, &pressure, &[TOP, BOTTOM, SIDE]).unwrap();
    assert!(pressure_dofs.is_empty());

    let result = extract_boundary_dofs(&mesh, &dof_map, &element, &ComponentMask::new(vec![true]), &[SIDE]);
    assert!(matches!(result, Err(DarcyError::Configuration(_))));
}

#[test]
fn boundary_values_reject_conflicts() {
    let mut values = BoundaryValues::new();
    values.insert_all(&[3, 1, 2], 0.0).unwrap();
    // Prescribing the same value twice is fine
    values.insert(2, 0.0).unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values.get(1), Some(0.0));
    assert_eq!(values.get(4), None);

    assert!(matches!(values.insert(2, -1.0), Err(DarcyError::Configuration(_))));
    assert!(matches!(values.insert_all(&[5, 3], -1.0), Err(DarcyError::Configuration(_))));
    assert_eq!(values.get(2), Some(0.0));

    let entries: Vec<_> = values.iter().collect();
    assert_eq!(entries[..3], [(1, 0.0), (2, 0.0), (3, 0.0)]);
}

#[test]
fn apply_boundary_values_eliminates_rows_and_columns() {
    let (mut matrix, mut rhs) = tridiagonal_system();
    let mut values = BoundaryValues::new();
    values.insert(1, 2.0).unwrap();
    apply_boundary_values(&values, &mut matrix, &mut rhs).unwrap();

    #[rustfmt::skip]
    let expected_matrix = DMatrix::from_row_slice(3, 3, &[
        4.0, 0.0, 0.0,
        0.0, 1.0, 0.0,
        0.0, 0.0, 5.0,
    ]);
    assert_matrix_eq!(DMatrix::from(&matrix), expected_matrix);
    assert_matrix_eq!(rhs, DVector::from_column_slice(&[-1.0, 2.0, -1.0]));
    assert_eq!(max_asymmetry(&matrix), 0.0);
}

#[test]
fn apply_boundary_values_preserves_solution() {
    // Eliminating a dof with its exact value must not change the solution
    let (matrix, rhs) = tridiagonal_system();
    let exact = DMatrix::from(&matrix).lu().solve(&rhs).unwrap();

    let (mut constrained_matrix, mut constrained_rhs) = tridiagonal_system();
    let mut values = BoundaryValues::new();
    values.insert(0, exact[0]).unwrap();
    values.insert(2, exact[2]).unwrap();
    apply_boundary_values(&values, &mut constrained_matrix, &mut constrained_rhs).unwrap();
    let solution = DMatrix::from(&constrained_matrix)
        .lu()
        .solve(&constrained_rhs)
        .unwrap();
    assert_matrix_eq!(solution, exact, comp = abs, tol = 1e-14);
}

#[test]
fn apply_boundary_values_requires_diagonal_and_valid_dofs() {
    let mut matrix = CsrMatrix::try_from_csr_data(2, 2, vec![0, 1, 2], vec![1, 0], vec![1.0, 1.0]).unwrap();
    let mut rhs = DVector::zeros(2);
    let mut values = BoundaryValues::new();
    values.insert(0, 1.0).unwrap();
    assert!(matches!(
        apply_boundary_values(&values, &mut matrix, &mut rhs),
        Err(DarcyError::Assembly(_))
    ));

    let (mut matrix, mut rhs) = tridiagonal_system();
    let mut values = BoundaryValues::new();
    values.insert(3, 1.0).unwrap();
    assert!(matches!(
        apply_boundary_values(&values, &mut matrix, &mut rhs),
        Err(DarcyError::Assembly(_))
    ));

    let mut short_rhs = DVector::zeros(2);
    assert!(matches!(
        apply_boundary_values(&BoundaryValues::new(), &mut matrix, &mut short_rhs),
        Err(DarcyError::Assembly(_))
    ));
}
