use super::data_output_path;
use darcy::assembly::global::SystemAssembler;
use darcy::block::BlockSizes;
use darcy::problem::{run, DarcyConfig, DarcyProblem};
use darcy::solver::{DenseLu, SparseLu};
use matrixcompare::assert_matrix_eq;
use util::max_asymmetry;

fn small_config(degree: usize, refinement_level: usize) -> DarcyConfig {
    DarcyConfig {
        degree,
        refinement_level,
        output_path: None,
        ..DarcyConfig::default()
    }
}

#[test]
fn reference_problem_runs_end_to_end() {
    let output = data_output_path().join("pipeline").join("reference_solution.vtk");
    let config = DarcyConfig {
        output_path: Some(output.clone()),
        ..DarcyConfig::default()
    };
    let summary = run(config).unwrap();
    println!("{}", summary);

    assert_eq!(summary.num_active_cells, 256);
    assert_eq!(summary.num_total_cells, 340);
    assert_eq!(summary.block_sizes, BlockSizes::new(4728, 2304));
    assert!(output.exists());

    let errors = summary.errors;
    assert!(errors.pressure.is_finite() && errors.pressure >= 0.0);
    assert!(errors.velocity.is_finite() && errors.velocity >= 0.0);
    // The pressure is cubic, so degree two leaves a small projection error
    assert!(errors.pressure < 1e-4, "pressure error {:e}", errors.pressure);
    // The quadratic velocity is contained in the velocity space
    assert!(errors.velocity < 1e-8, "velocity error {:e}", errors.velocity);

    let coarser = run(small_config(2, 2)).unwrap();
    assert!(errors.pressure < coarser.errors.pressure);
}

#[test]
fn serial_and_parallel_assembly_agree() {
    let problem = DarcyProblem::setup(small_config(1, 2)).unwrap();
    let serial = problem.assemble_system_with(SystemAssembler::serial()).unwrap();
    let parallel = problem.assemble_system_with(SystemAssembler::parallel()).unwrap();

    assert_eq!(serial.matrix.matrix(), parallel.matrix.matrix());
    assert_eq!(serial.rhs.as_vector(), parallel.rhs.as_vector());
}

#[test]
fn boundary_elimination_preserves_symmetry() {
    let problem = DarcyProblem::setup(small_config(2, 1)).unwrap();
    let mut system = problem.assemble_system().unwrap();
    assert_eq!(max_asymmetry(system.matrix.matrix()), 0.0);

    problem.apply_boundary_conditions(&mut system).unwrap();
    assert_eq!(max_asymmetry(system.matrix.matrix()), 0.0);

    // Constrained rows carry the prescribed values directly
    let values = problem.boundary_values().unwrap();
    for (dof, value) in values.iter() {
        assert_eq!(system.rhs.as_vector()[dof], value);
    }
}

#[test]
fn sparse_and_dense_solvers_agree() {
    let problem = DarcyProblem::setup(small_config(1, 1)).unwrap();
    let mut system = problem.assemble_system().unwrap();
    problem.apply_boundary_conditions(&mut system).unwrap();

    let sparse = problem.solve_with(&SparseLu, &system).unwrap();
    let dense = problem.solve_with(&DenseLu, &system).unwrap();
    assert_matrix_eq!(sparse.clone().into_vector(), dense.clone().into_vector(), comp = abs, tol = 1e-10);

    let sparse_errors = problem.compute_errors(&sparse).unwrap();
    let dense_errors = problem.compute_errors(&dense).unwrap();
    assert!((sparse_errors.pressure - dense_errors.pressure).abs() < 1e-10);
    assert!((sparse_errors.velocity - dense_errors.velocity).abs() < 1e-10);
}

#[test]
fn solution_satisfies_imposed_fluxes() {
    let problem = DarcyProblem::setup(small_config(0, 2)).unwrap();
    let (solution, _) = problem.run().unwrap();
    let values = problem.boundary_values().unwrap();
    for (dof, value) in values.iter() {
        assert!((solution.as_vector()[dof] - value).abs() < 1e-10);
    }
}
