pub mod config;
pub mod coords;
pub mod curve;
pub mod grid;

pub use config::{
    DrawMode, LodInfo, NoiseParameters, NormalizeMode, TerrainConfig, TerrainType,
    MAP_CHUNK_SIZE, MAX_PREVIEW_LOD,
};
pub use coords::{ChunkBounds, ChunkCoord};
pub use curve::HeightCurve;
pub use grid::{ColorGrid, HeightGrid, Rgba};
