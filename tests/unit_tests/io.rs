use crate::coarse_channel_mesh;
use darcy::dof_map::DofMap;
use darcy::element::MixedElement;
use darcy::io::vtk::{evaluate_solution_at_cell_corners, write_solution_vtk, FiniteElementMeshDataSetBuilder};
use darcy::vtkio::model::{Attribute, DataSet, Piece};
use matrixcompare::assert_scalar_eq;
use nalgebra::DVector;
use std::path::PathBuf;

fn output_path(file_name: &str) -> PathBuf {
    PathBuf::from("data/unit_tests/io").join(file_name)
}

#[test]
fn data_set_contains_cells_and_attributes() {
    let mesh = coarse_channel_mesh();
    let point_values: Vec<f64> = mesh.vertices().iter().map(|v| v.x).collect();
    let cell_values = vec![1.0, 2.0, 3.0, 4.0];
    let data_set = FiniteElementMeshDataSetBuilder::from_mesh(&mesh)
        .with_point_scalar_attributes("x", &point_values)
        .with_cell_scalar_attributes("index", &cell_values)
        .try_build()
        .unwrap();

    let piece = match data_set {
        DataSet::UnstructuredGrid { pieces, .. } => match pieces.into_iter().next() {
            Some(Piece::Inline(piece)) => piece,
            _ => panic!("expected a single inline piece"),
        },
        _ => panic!("expected an unstructured grid"),
    };
    assert_eq!(piece.num_points(), mesh.vertices().len());
    assert_eq!(piece.cells.types.len(), 4);
    assert_eq!(piece.data.point.len(), 1);
    assert_eq!(piece.data.cell.len(), 1);
    match &piece.data.cell[0] {
        Attribute::DataArray(array) => assert_eq!(array.name, "index"),
        _ => panic!("expected a data array"),
    }
}

#[test]
fn attribute_lengths_are_checked() {
    let mesh = coarse_channel_mesh();
    let too_short = vec![0.0; 3];
    assert!(FiniteElementMeshDataSetBuilder::from_mesh(&mesh)
        .with_point_scalar_attributes("p", &too_short)
        .try_build()
        .is_err());
    assert!(FiniteElementMeshDataSetBuilder::from_mesh(&mesh)
        .with_cell_scalar_attributes("c", &too_short)
        .try_build()
        .is_err());
}

#[test]
fn export_creates_file() {
    let mesh = coarse_channel_mesh();
    let path = output_path("coarse_channel.vtk");
    FiniteElementMeshDataSetBuilder::from_mesh(&mesh)
        .with_title("coarse channel")
        .try_export(&path)
        .unwrap();
    assert!(path.exists());
}

#[test]
fn solution_is_evaluated_at_cell_corners() {
    let mesh = coarse_channel_mesh();
    let element = MixedElement::new(1);
    let dof_map = DofMap::assign(&mesh, &element).unwrap();

    // Pressure equal to one everywhere, zero velocity
    let mut solution: DVector<f64> = DVector::zeros(dof_map.n_dofs());
    solution.rows_mut(dof_map.velocity_range().end, dof_map.pressure_range().len()).fill(1.0);

    let fields = evaluate_solution_at_cell_corners(&mesh, &dof_map, &element, &solution).unwrap();
    assert_eq!(fields.len(), 3);
    for field in &fields {
        assert_eq!(field.len(), 4 * mesh.connectivity().len());
    }
    assert!(fields[0].iter().chain(&fields[1]).all(|&u| u == 0.0));
    for &p in &fields[2] {
        assert_scalar_eq!(p, 1.0, comp = abs, tol = 1e-13);
    }

    let path = output_path("constant_pressure.vtk");
    write_solution_vtk(&mesh, &dof_map, &element, &solution, &["u", "v", "p"], &path).unwrap();
    assert!(path.exists());

    assert!(write_solution_vtk(&mesh, &dof_map, &element, &solution, &["u", "v"], &path).is_err());
    let short_solution = DVector::zeros(dof_map.n_dofs() - 1);
    assert!(evaluate_solution_at_cell_corners(&mesh, &dof_map, &element, &short_solution).is_err());
}
