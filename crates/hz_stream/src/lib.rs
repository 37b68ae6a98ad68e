pub mod chunk;
pub mod generation;
pub mod manager;
pub mod presentation;
pub mod preview;

pub use chunk::{LodMesh, RefreshContext, TerrainChunk};
pub use generation::{GenerationError, GenerationService, GenerationStats, ResultQueue};
pub use manager::{ChunkManager, MeshTicket};
pub use presentation::{CommandBuffer, PresentationCommand, PresentationSink, TextureSource};
pub use preview::draw_preview;
