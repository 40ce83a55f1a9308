//! Basic procedural mesh generation routines.
use crate::connectivity::Quad4d2Connectivity;
use crate::mesh::QuadMesh2d;
use nalgebra::Point2;

pub fn create_unit_square_uniform_quad_mesh_2d(cells_per_dim: usize) -> QuadMesh2d<f64> {
    create_rectangular_quad_mesh_2d(
        &Point2::new(0.0, 0.0),
        &Point2::new(1.0, 1.0),
        [cells_per_dim, cells_per_dim],
    )
}

/// Coordinate of grid line `i` out of `n` intervals on `[a, b]`.
///
/// The end points are reproduced exactly, so that vertices on the boundary of the rectangle
/// lie exactly on the boundary.
fn grid_coordinate(a: f64, b: f64, i: usize, n: usize) -> f64 {
    if i == n {
        b
    } else {
        a + (b - a) * (i as f64 / n as f64)
    }
}

/// Generates an axis-aligned uniform quadrilateral mesh of the rectangle spanned by the
/// given corners, with `subdivisions[0]` cells along x and `subdivisions[1]` cells along y.
///
/// Cells are numbered row by row starting from the bottom left, and the vertices of every
/// cell are ordered counter-clockwise starting from its bottom-left corner. An empty mesh is
/// returned if either subdivision count is zero.
pub fn create_rectangular_quad_mesh_2d(
    bottom_left: &Point2<f64>,
    top_right: &Point2<f64>,
    subdivisions: [usize; 2],
) -> QuadMesh2d<f64> {
    let [num_cells_x, num_cells_y] = subdivisions;
    if num_cells_x == 0 || num_cells_y == 0 {
        return QuadMesh2d::from_vertices_and_connectivity(Vec::new(), Vec::new());
    }

    let num_vertices_x = num_cells_x + 1;
    let num_vertices_y = num_cells_y + 1;
    let to_global_vertex_index = |i, j| num_vertices_x * j + i;

    let mut vertices = Vec::with_capacity(num_vertices_x * num_vertices_y);
    for j in 0..num_vertices_y {
        let y = grid_coordinate(bottom_left.y, top_right.y, j, num_cells_y);
        for i in 0..num_vertices_x {
            let x = grid_coordinate(bottom_left.x, top_right.x, i, num_cells_x);
            vertices.push(Point2::new(x, y));
        }
    }

    let mut cells = Vec::with_capacity(num_cells_x * num_cells_y);
    for j in 0..num_cells_y {
        for i in 0..num_cells_x {
            cells.push(Quad4d2Connectivity([
                to_global_vertex_index(i, j),
                to_global_vertex_index(i + 1, j),
                to_global_vertex_index(i + 1, j + 1),
                to_global_vertex_index(i, j + 1),
            ]));
        }
    }

    QuadMesh2d::from_vertices_and_connectivity(vertices, cells)
}
