//! Export of meshes and discrete solutions.
pub mod vtk;
