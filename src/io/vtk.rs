//! Legacy VTK export of meshes and cellwise discontinuous solution fields.
use crate::assembly::local::CellValues;
use crate::connectivity::{CellConnectivity, Connectivity, Quad4d2Connectivity, Segment2d2Connectivity};
use crate::dof_map::DofMap;
use crate::element::MixedElement;
use crate::mesh::{Mesh, QuadMesh2d};
use eyre::{eyre, WrapErr};
use log::info;
use nalgebra::allocator::Allocator;
use nalgebra::{DVector, DefaultAllocator, DimName, Point2, Scalar, Vector3};
use num::ToPrimitive;
use std::convert::TryInto;
use std::path::Path;
use vtkio::model::{
    Attribute, Attributes, ByteOrder, CellType, Cells, DataArray, DataSet, ElementType, IOBuffer, Piece,
    UnstructuredGridPiece, Version, VertexNumbers, Vtk,
};

/// Represents connectivity that is supported by VTK.
pub trait VtkCellConnectivity: Connectivity {
    fn num_nodes(&self) -> usize {
        self.vertex_indices().len()
    }

    fn cell_type(&self) -> CellType;

    /// Write connectivity into the provided buffer.
    ///
    /// Panics if `connectivity.len() != self.num_nodes()`.
    fn write_vtk_connectivity(&self, connectivity: &mut [usize]) {
        assert_eq!(connectivity.len(), self.vertex_indices().len());
        connectivity.clone_from_slice(self.vertex_indices());
    }
}

impl VtkCellConnectivity for Segment2d2Connectivity {
    fn cell_type(&self) -> CellType {
        CellType::Line
    }
}

impl VtkCellConnectivity for Quad4d2Connectivity {
    fn cell_type(&self) -> CellType {
        CellType::Quad
    }
}

#[derive(Debug, Clone)]
struct ScalarAttribute {
    name: String,
    values: Vec<f64>,
}

impl ScalarAttribute {
    fn into_vtk(self) -> Attribute {
        Attribute::DataArray(DataArray {
            name: self.name,
            elem: ElementType::Scalars {
                num_comp: 1,
                lookup_table: None,
            },
            data: IOBuffer::F64(self.values),
        })
    }
}

/// Builds a VTK unstructured grid from a mesh, optionally with scalar point and cell data.
///
/// ```ignore
/// FiniteElementMeshDataSetBuilder::from_mesh(&mesh)
///     .with_title("pressure")
///     .with_point_scalar_attributes("p", &p_values)
///     .try_export("pressure.vtk")?;
/// ```
pub struct FiniteElementMeshDataSetBuilder<'a, T, D, C>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    mesh: &'a Mesh<T, D, C>,
    // Only used for exporting directly to file
    title: Option<String>,
    point_attributes: Vec<ScalarAttribute>,
    cell_attributes: Vec<ScalarAttribute>,
}

impl<'a, T, D, C> FiniteElementMeshDataSetBuilder<'a, T, D, C>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn from_mesh(mesh: &'a Mesh<T, D, C>) -> Self {
        Self {
            mesh,
            title: None,
            point_attributes: Vec::new(),
            cell_attributes: Vec::new(),
        }
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..self
        }
    }

    /// Attaches one scalar per mesh vertex.
    ///
    /// The length is checked when the data set is built.
    pub fn with_point_scalar_attributes(mut self, name: impl Into<String>, values: &[f64]) -> Self {
        self.point_attributes.push(ScalarAttribute {
            name: name.into(),
            values: values.to_vec(),
        });
        self
    }

    /// Attaches one scalar per mesh cell.
    ///
    /// The length is checked when the data set is built.
    pub fn with_cell_scalar_attributes(mut self, name: impl Into<String>, values: &[f64]) -> Self {
        self.cell_attributes.push(ScalarAttribute {
            name: name.into(),
            values: values.to_vec(),
        });
        self
    }
}

impl<'a, T, D, C> FiniteElementMeshDataSetBuilder<'a, T, D, C>
where
    T: Scalar + ToPrimitive,
    D: DimName,
    C: VtkCellConnectivity,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn try_build(&self) -> eyre::Result<DataSet> {
        if D::dim() > 3 {
            return Err(eyre!("unable to export meshes of dimension {} to VTK", D::dim()));
        }

        let num_vertices = self.mesh.vertices().len();
        let num_cells = self.mesh.connectivity().len();
        for attribute in &self.point_attributes {
            if attribute.values.len() != num_vertices {
                return Err(eyre!(
                    "point attribute '{}' has {} values, but the mesh has {} vertices",
                    attribute.name,
                    attribute.values.len(),
                    num_vertices
                ));
            }
        }
        for attribute in &self.cell_attributes {
            if attribute.values.len() != num_cells {
                return Err(eyre!(
                    "cell attribute '{}' has {} values, but the mesh has {} cells",
                    attribute.name,
                    attribute.values.len(),
                    num_cells
                ));
            }
        }

        let mut points = Vec::with_capacity(3 * num_vertices);
        for v in self.mesh.vertices() {
            for x in v.coords.iter() {
                let x = x
                    .to_f64()
                    .ok_or_else(|| eyre!("vertex coordinate is not representable as f64"))?;
                points.push(x);
            }
            for _ in D::dim()..3 {
                points.push(0.0);
            }
        }

        // Vertices is laid out as follows: N, i_1, i_2, ... i_N,
        // so for e.g. quads this becomes 4 followed by the four indices making up the quad
        let mut vertices = Vec::new();
        let mut cell_types = Vec::with_capacity(num_cells);
        let mut vertex_indices = Vec::new();
        for cell in self.mesh.connectivity() {
            vertices.push(
                cell.num_nodes()
                    .try_into()
                    .wrap_err("too many nodes in cell")?,
            );

            vertex_indices.clear();
            vertex_indices.resize(cell.num_nodes(), 0);
            cell.write_vtk_connectivity(&mut vertex_indices);

            for &idx in &vertex_indices {
                vertices.push(idx.try_into().wrap_err("vertex index exceeds u32 range")?);
            }
            cell_types.push(cell.cell_type());
        }

        let piece = UnstructuredGridPiece {
            points: IOBuffer::F64(points),
            cells: Cells {
                cell_verts: VertexNumbers::Legacy {
                    num_cells: num_cells.try_into().wrap_err("too many cells")?,
                    vertices,
                },
                types: cell_types,
            },
            data: Attributes {
                point: self
                    .point_attributes
                    .iter()
                    .cloned()
                    .map(ScalarAttribute::into_vtk)
                    .collect(),
                cell: self
                    .cell_attributes
                    .iter()
                    .cloned()
                    .map(ScalarAttribute::into_vtk)
                    .collect(),
            },
        };

        Ok(DataSet::UnstructuredGrid {
            meta: None,
            pieces: vec![Piece::Inline(Box::new(piece))],
        })
    }

    /// Convenience function for directly exporting the dataset to a file.
    ///
    /// Parent directories are created as needed.
    pub fn try_export(&self, filename: impl AsRef<Path>) -> eyre::Result<()> {
        let filepath = filename.as_ref();
        let fallback_title = filepath
            .file_stem()
            .map(|os_str| os_str.to_string_lossy().to_string())
            .unwrap_or_else(|| "untitled".to_string());
        let dataset = self.try_build()?;

        if let Some(parent) = filepath.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .wrap_err_with(|| format!("failed to create directory {}", parent.display()))?;
            }
        }

        Vtk {
            version: Version { major: 4, minor: 1 },
            // If we don't have a title then just make the file stem the title
            title: self.title.clone().unwrap_or(fallback_title),
            byte_order: ByteOrder::BigEndian,
            data: dataset,
            file_path: None,
        }
        .export(filepath)
        .wrap_err_with(|| format!("failed to write VTK file {}", filepath.display()))?;
        Ok(())
    }
}

/// Reference corners of the unit quadrilateral, in the same order as the cell vertices.
fn reference_corners() -> Vec<Point2<f64>> {
    vec![
        Point2::new(-1.0, -1.0),
        Point2::new(1.0, -1.0),
        Point2::new(1.0, 1.0),
        Point2::new(-1.0, 1.0),
    ]
}

/// Evaluates the discrete solution at the corners of every cell.
///
/// Returns one vector per solution component, each indexed like the vertices of
/// `mesh.disconnect_cells()`.
pub fn evaluate_solution_at_cell_corners(
    mesh: &QuadMesh2d<f64>,
    dof_map: &DofMap,
    element: &MixedElement,
    solution: &DVector<f64>,
) -> eyre::Result<Vec<Vec<f64>>> {
    if solution.len() != dof_map.n_dofs() {
        return Err(eyre!(
            "solution has {} entries, but there are {} dofs",
            solution.len(),
            dof_map.n_dofs()
        ));
    }

    let corners = reference_corners();
    let weights = vec![0.0; corners.len()];
    let mut cell_values = CellValues::new(element, &(weights, corners));

    let n_components = element.n_components();
    let num_points = 4 * dof_map.n_cells();
    let mut fields = vec![Vec::with_capacity(num_points); n_components];
    let mut coefficients = vec![0.0; element.n_dofs()];
    let mut corner_values = vec![Vector3::zeros(); 4];

    for (cell_idx, conn) in mesh.connectivity().iter().enumerate() {
        let cell = conn
            .cell(mesh.vertices())
            .ok_or_else(|| eyre!("cell {} references missing vertices", cell_idx))?;
        cell_values.reinit(&cell, dof_map.cell_orientations(cell_idx))?;
        for (c, &dof) in coefficients.iter_mut().zip(dof_map.cell_dofs(cell_idx)) {
            *c = solution[dof];
        }
        cell_values.solution_values(&coefficients, &mut corner_values)?;
        for value in &corner_values {
            for (component, field) in fields.iter_mut().enumerate() {
                field.push(value[component]);
            }
        }
    }
    Ok(fields)
}

/// Writes the discrete solution to a legacy VTK file.
///
/// Since both fields are discontinuous, the solution is written on a mesh whose cells are
/// disconnected from each other, with one point per cell corner. `field_names` names the
/// solution components in order, e.g. `["u", "v", "p"]`.
pub fn write_solution_vtk(
    mesh: &QuadMesh2d<f64>,
    dof_map: &DofMap,
    element: &MixedElement,
    solution: &DVector<f64>,
    field_names: &[&str],
    filename: impl AsRef<Path>,
) -> eyre::Result<()> {
    if field_names.len() != element.n_components() {
        return Err(eyre!(
            "got {} field names for {} solution components",
            field_names.len(),
            element.n_components()
        ));
    }

    let fields = evaluate_solution_at_cell_corners(mesh, dof_map, element, solution)?;
    let patches = mesh.disconnect_cells();
    let mut builder = FiniteElementMeshDataSetBuilder::from_mesh(&patches).with_title("solution");
    for (name, values) in field_names.iter().zip(&fields) {
        builder = builder.with_point_scalar_attributes(*name, values);
    }
    builder.try_export(filename.as_ref())?;
    info!("Wrote solution to {}", filename.as_ref().display());
    Ok(())
}
