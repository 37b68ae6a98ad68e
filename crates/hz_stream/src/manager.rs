use bevy::log::{debug, info};
use bevy::math::Vec2;
use bevy::prelude::Resource;
use hz_core::{ChunkCoord, LodInfo, TerrainConfig};
use std::collections::HashMap;

use crate::chunk::{RefreshContext, TerrainChunk};
use crate::generation::{GenerationError, GenerationService, GenerationStats};
use crate::presentation::PresentationSink;

/// Tag carried by a mesh request so the result finds its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshTicket {
    pub coord: ChunkCoord,
    pub lod_index: usize,
}

/// Streams chunks in and out around a moving viewer.
///
/// Chunks are created on first sight and kept for the lifetime of the
/// manager; leaving view only hides them.
#[derive(Resource)]
pub struct ChunkManager {
    service: GenerationService<ChunkCoord, MeshTicket>,
    chunks: HashMap<ChunkCoord, TerrainChunk>,
    visible_last_update: Vec<ChunkCoord>,
    detail_levels: Vec<LodInfo>,
    chunk_size: f32,
    max_view_distance: f32,
    chunks_visible_in_view_distance: i32,
    world_scale: f32,
    sqr_move_threshold: f32,
    viewer_position: Vec2,
    viewer_position_old: Option<Vec2>,
    visibility_passes: usize,
}

impl ChunkManager {
    pub fn new(config: TerrainConfig) -> Result<Self, GenerationError> {
        let service = GenerationService::new(config)?;
        let config = service.config();

        let chunk_size = config.chunk_size() as f32;
        let max_view_distance = config.max_view_distance();
        let chunks_visible_in_view_distance = (max_view_distance / chunk_size).round() as i32;
        info!(
            "Chunk manager ready: chunk size {}, view distance {}, {} chunks each way",
            chunk_size, max_view_distance, chunks_visible_in_view_distance
        );

        Ok(Self {
            detail_levels: config.detail_levels.clone(),
            chunk_size,
            max_view_distance,
            chunks_visible_in_view_distance,
            world_scale: config.world_scale,
            sqr_move_threshold: config.viewer_move_threshold * config.viewer_move_threshold,
            service,
            chunks: HashMap::new(),
            visible_last_update: Vec::new(),
            viewer_position: Vec2::ZERO,
            viewer_position_old: None,
            visibility_passes: 0,
        })
    }

    /// Per-tick entry point. `viewer_world` is the viewer's ground-plane
    /// position in world units.
    pub fn update(&mut self, viewer_world: Vec2, sink: &mut dyn PresentationSink) {
        self.viewer_position = viewer_world / self.world_scale;

        let moved = self.viewer_position_old.map_or(true, |old| {
            old.distance_squared(self.viewer_position) > self.sqr_move_threshold
        });
        if moved {
            self.viewer_position_old = Some(self.viewer_position);
            self.update_visible_chunks(sink);
        }

        self.process_results(sink);
    }

    fn update_visible_chunks(&mut self, sink: &mut dyn PresentationSink) {
        self.visibility_passes += 1;

        for coord in std::mem::take(&mut self.visible_last_update) {
            if let Some(chunk) = self.chunks.get_mut(&coord) {
                chunk.set_visible(false, sink);
            }
        }

        let current = ChunkCoord::from_world(self.viewer_position, self.chunk_size);
        let range = self.chunks_visible_in_view_distance;
        let mut created = 0;

        for y_offset in -range..=range {
            for x_offset in -range..=range {
                let coord = current.offset(x_offset, y_offset);
                match self.chunks.get_mut(&coord) {
                    Some(chunk) => chunk.refresh(&mut RefreshContext {
                        viewer_position: self.viewer_position,
                        max_view_distance: self.max_view_distance,
                        service: &self.service,
                        visible_last_update: &mut self.visible_last_update,
                        sink: &mut *sink,
                    }),
                    None => {
                        debug!("Creating chunk {:?}", coord);
                        let chunk = TerrainChunk::new(
                            coord,
                            self.chunk_size,
                            self.world_scale,
                            &self.detail_levels,
                            &self.service,
                            &mut *sink,
                        );
                        self.chunks.insert(coord, chunk);
                        created += 1;
                    }
                }
            }
        }

        debug!(
            "Visible chunk pass around {:?}: {} created, {} visible, {} total",
            current,
            created,
            self.visible_last_update.len(),
            self.chunks.len()
        );
    }

    /// Route finished generation results to their chunks.
    fn process_results(&mut self, sink: &mut dyn PresentationSink) {
        let Self {
            service,
            chunks,
            visible_last_update,
            viewer_position,
            max_view_distance,
            ..
        } = self;

        let mut ctx = RefreshContext {
            viewer_position: *viewer_position,
            max_view_distance: *max_view_distance,
            service,
            visible_last_update,
            sink,
        };

        service.drain_map_data(|coord, map_data| {
            if let Some(chunk) = chunks.get_mut(&coord) {
                chunk.on_map_data_received(map_data, &mut ctx);
            }
        });
        service.drain_mesh_data(|ticket, mesh| {
            if let Some(chunk) = chunks.get_mut(&ticket.coord) {
                chunk.on_mesh_data_received(ticket.lod_index, mesh, &mut ctx);
            }
        });
    }

    /// Replace generation settings for chunks requested from now on.
    ///
    /// Chunk size and the LOD table stay as they were at construction.
    pub fn update_generation_config(&mut self, config: TerrainConfig) {
        self.service.update_config(config);
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&TerrainChunk> {
        self.chunks.get(&coord)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn visible_chunks(&self) -> &[ChunkCoord] {
        &self.visible_last_update
    }

    pub fn chunk_size(&self) -> f32 {
        self.chunk_size
    }

    pub fn chunks_visible_in_view_distance(&self) -> i32 {
        self.chunks_visible_in_view_distance
    }

    /// Viewer position in terrain units from the last update.
    pub fn viewer_position(&self) -> Vec2 {
        self.viewer_position
    }

    /// Number of times the visible set has been recomputed.
    pub fn visibility_passes(&self) -> usize {
        self.visibility_passes
    }

    pub fn pending_requests(&self) -> usize {
        self.service.stats().pending()
    }

    pub fn stats(&self) -> &GenerationStats {
        self.service.stats()
    }

    pub fn service(&self) -> &GenerationService<ChunkCoord, MeshTicket> {
        &self.service
    }
}
