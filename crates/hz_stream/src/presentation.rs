use bevy::math::Vec3;
use bevy::prelude::Resource;
use hz_core::{ChunkCoord, ColorGrid, HeightGrid};
use hz_mesh::MeshData;
use hz_noise::MapData;
use std::sync::Arc;

/// Image handed to the preview surface.
#[derive(Clone, Debug, PartialEq)]
pub enum TextureSource {
    /// Rendered as grayscale, clamped to `[0, 1]`.
    Heights(HeightGrid),
    Colors(ColorGrid),
}

/// Where streamed chunks and previews end up.
///
/// Calls are only made from the thread that owns the chunk manager.
pub trait PresentationSink {
    /// Create the scene object for a chunk. New chunks start hidden.
    fn spawn_chunk(&mut self, coord: ChunkCoord, position: Vec3, scale: f32);

    fn set_chunk_texture(&mut self, coord: ChunkCoord, map_data: &Arc<MapData>);

    fn set_chunk_mesh(&mut self, coord: ChunkCoord, lod_index: usize, mesh: &Arc<MeshData>);

    fn set_chunk_collider(&mut self, coord: ChunkCoord, mesh: &Arc<MeshData>);

    fn set_chunk_visible(&mut self, coord: ChunkCoord, visible: bool);

    fn draw_texture(&mut self, texture: TextureSource);

    fn draw_mesh(&mut self, mesh: MeshData, colors: ColorGrid);
}

/// A recorded [`PresentationSink`] call.
#[derive(Clone, Debug)]
pub enum PresentationCommand {
    SpawnChunk {
        coord: ChunkCoord,
        position: Vec3,
        scale: f32,
    },
    ChunkTexture {
        coord: ChunkCoord,
        map_data: Arc<MapData>,
    },
    ChunkMesh {
        coord: ChunkCoord,
        lod_index: usize,
        mesh: Arc<MeshData>,
    },
    ChunkCollider {
        coord: ChunkCoord,
        mesh: Arc<MeshData>,
    },
    ChunkVisibility {
        coord: ChunkCoord,
        visible: bool,
    },
    DrawTexture(TextureSource),
    DrawMesh {
        mesh: MeshData,
        colors: ColorGrid,
    },
}

/// Sink that records commands for a later system to apply.
#[derive(Resource, Default, Debug)]
pub struct CommandBuffer {
    commands: Vec<PresentationCommand>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[PresentationCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, PresentationCommand> {
        self.commands.drain(..)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl PresentationSink for CommandBuffer {
    fn spawn_chunk(&mut self, coord: ChunkCoord, position: Vec3, scale: f32) {
        self.commands.push(PresentationCommand::SpawnChunk {
            coord,
            position,
            scale,
        });
    }

    fn set_chunk_texture(&mut self, coord: ChunkCoord, map_data: &Arc<MapData>) {
        self.commands.push(PresentationCommand::ChunkTexture {
            coord,
            map_data: Arc::clone(map_data),
        });
    }

    fn set_chunk_mesh(&mut self, coord: ChunkCoord, lod_index: usize, mesh: &Arc<MeshData>) {
        self.commands.push(PresentationCommand::ChunkMesh {
            coord,
            lod_index,
            mesh: Arc::clone(mesh),
        });
    }

    fn set_chunk_collider(&mut self, coord: ChunkCoord, mesh: &Arc<MeshData>) {
        self.commands.push(PresentationCommand::ChunkCollider {
            coord,
            mesh: Arc::clone(mesh),
        });
    }

    fn set_chunk_visible(&mut self, coord: ChunkCoord, visible: bool) {
        self.commands
            .push(PresentationCommand::ChunkVisibility { coord, visible });
    }

    fn draw_texture(&mut self, texture: TextureSource) {
        self.commands.push(PresentationCommand::DrawTexture(texture));
    }

    fn draw_mesh(&mut self, mesh: MeshData, colors: ColorGrid) {
        self.commands
            .push(PresentationCommand::DrawMesh { mesh, colors });
    }
}
