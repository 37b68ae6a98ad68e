pub mod mesh_builder;

pub use mesh_builder::{build_terrain_mesh, simplification_increment, MeshData};
