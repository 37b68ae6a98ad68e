use bevy::log::debug;
use bevy::math::{Vec2, Vec3};
use hz_core::{ChunkBounds, ChunkCoord, LodInfo};
use hz_mesh::MeshData;
use hz_noise::MapData;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::generation::GenerationService;
use crate::manager::MeshTicket;
use crate::presentation::PresentationSink;

/// Mesh slot for one level of detail of one chunk.
#[derive(Clone, Debug)]
pub struct LodMesh {
    lod: u32,
    mesh: Option<Arc<MeshData>>,
    has_requested_mesh: bool,
}

impl LodMesh {
    pub fn new(lod: u32) -> Self {
        Self {
            lod,
            mesh: None,
            has_requested_mesh: false,
        }
    }

    pub fn lod(&self) -> u32 {
        self.lod
    }

    pub fn mesh(&self) -> Option<&Arc<MeshData>> {
        self.mesh.as_ref()
    }

    /// Queue a build unless one was already requested. Returns whether a
    /// job was issued.
    pub fn request_mesh(
        &mut self,
        map_data: &Arc<MapData>,
        service: &GenerationService<ChunkCoord, MeshTicket>,
        ticket: MeshTicket,
    ) -> bool {
        if self.has_requested_mesh {
            return false;
        }
        self.has_requested_mesh = true;
        service.request_mesh_data(Arc::clone(map_data), self.lod, ticket);
        true
    }

    pub fn on_mesh_received(&mut self, mesh: Arc<MeshData>) {
        self.mesh = Some(mesh);
    }
}

/// Borrowed state a chunk needs while refreshing.
pub struct RefreshContext<'a> {
    pub viewer_position: Vec2,
    pub max_view_distance: f32,
    pub service: &'a GenerationService<ChunkCoord, MeshTicket>,
    pub visible_last_update: &'a mut Vec<ChunkCoord>,
    pub sink: &'a mut dyn PresentationSink,
}

/// One streamed tile of terrain.
pub struct TerrainChunk {
    coord: ChunkCoord,
    position: Vec2,
    bounds: ChunkBounds,
    detail_levels: SmallVec<[LodInfo; 4]>,
    lod_meshes: SmallVec<[LodMesh; 4]>,
    collider_lod_index: Option<usize>,
    map_data: Option<Arc<MapData>>,
    previous_lod_index: Option<usize>,
    collider_assigned: bool,
    visible: bool,
}

impl TerrainChunk {
    /// Create the chunk hidden and request its map data.
    pub fn new(
        coord: ChunkCoord,
        chunk_size: f32,
        world_scale: f32,
        detail_levels: &[LodInfo],
        service: &GenerationService<ChunkCoord, MeshTicket>,
        sink: &mut dyn PresentationSink,
    ) -> Self {
        let position = coord.world_center(chunk_size);
        let bounds = ChunkBounds::new(position, chunk_size);

        sink.spawn_chunk(
            coord,
            Vec3::new(position.x, 0.0, position.y) * world_scale,
            world_scale,
        );
        sink.set_chunk_visible(coord, false);

        service.request_map_data(position, coord);

        Self {
            coord,
            position,
            bounds,
            detail_levels: detail_levels.iter().copied().collect(),
            lod_meshes: detail_levels.iter().map(|level| LodMesh::new(level.lod)).collect(),
            collider_lod_index: detail_levels.iter().position(|level| level.use_for_collider),
            map_data: None,
            previous_lod_index: None,
            collider_assigned: false,
            visible: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn map_data(&self) -> Option<&Arc<MapData>> {
        self.map_data.as_ref()
    }

    /// LOD slot currently displayed, if any mesh has been shown yet.
    pub fn current_lod_index(&self) -> Option<usize> {
        self.previous_lod_index
    }

    pub fn current_mesh(&self) -> Option<&Arc<MeshData>> {
        self.previous_lod_index
            .and_then(|index| self.lod_meshes[index].mesh())
    }

    pub fn collider_mesh(&self) -> Option<&Arc<MeshData>> {
        if !self.collider_assigned {
            return None;
        }
        self.collider_lod_index
            .and_then(|index| self.lod_meshes[index].mesh())
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool, sink: &mut dyn PresentationSink) {
        if self.visible != visible {
            self.visible = visible;
            sink.set_chunk_visible(self.coord, visible);
        }
    }

    pub fn on_map_data_received(&mut self, map_data: Arc<MapData>, ctx: &mut RefreshContext) {
        ctx.sink.set_chunk_texture(self.coord, &map_data);
        self.map_data = Some(map_data);
        self.refresh(ctx);
    }

    pub fn on_mesh_data_received(
        &mut self,
        lod_index: usize,
        mesh: Arc<MeshData>,
        ctx: &mut RefreshContext,
    ) {
        match self.lod_meshes.get_mut(lod_index) {
            Some(slot) => slot.on_mesh_received(mesh),
            None => return,
        }
        self.refresh(ctx);
    }

    /// Index of the coarsest level whose threshold the distance exceeds.
    fn select_lod_index(&self, distance: f32) -> usize {
        let mut lod_index = 0;
        for (i, level) in self
            .detail_levels
            .iter()
            .enumerate()
            .take(self.detail_levels.len().saturating_sub(1))
        {
            if distance > level.visible_distance_threshold {
                lod_index = i + 1;
            } else {
                break;
            }
        }
        lod_index
    }

    /// Pick the LOD for the viewer's distance, show or request its mesh and
    /// update visibility. Does nothing until map data has arrived.
    pub fn refresh(&mut self, ctx: &mut RefreshContext) {
        let Some(map_data) = self.map_data.clone() else {
            return;
        };

        let distance = self.bounds.distance_to(ctx.viewer_position);
        let visible = !self.lod_meshes.is_empty() && distance <= ctx.max_view_distance;

        if visible {
            let lod_index = self.select_lod_index(distance);

            if self.previous_lod_index != Some(lod_index) {
                let ticket = MeshTicket {
                    coord: self.coord,
                    lod_index,
                };
                let slot = &mut self.lod_meshes[lod_index];
                if let Some(mesh) = slot.mesh() {
                    ctx.sink.set_chunk_mesh(self.coord, lod_index, mesh);
                    self.previous_lod_index = Some(lod_index);
                } else if slot.request_mesh(&map_data, ctx.service, ticket) {
                    debug!("Requested LOD {} mesh for chunk {:?}", slot.lod(), self.coord);
                }
            }

            if lod_index == 0 {
                self.refresh_collider(&map_data, ctx);
            }

            if !ctx.visible_last_update.contains(&self.coord) {
                ctx.visible_last_update.push(self.coord);
            }
        }

        self.set_visible(visible, ctx.sink);
    }

    fn refresh_collider(&mut self, map_data: &Arc<MapData>, ctx: &mut RefreshContext) {
        if self.collider_assigned {
            return;
        }
        let Some(index) = self.collider_lod_index else {
            return;
        };
        let slot = &mut self.lod_meshes[index];
        if let Some(mesh) = slot.mesh() {
            ctx.sink.set_chunk_collider(self.coord, mesh);
            self.collider_assigned = true;
        } else {
            slot.request_mesh(
                map_data,
                ctx.service,
                MeshTicket {
                    coord: self.coord,
                    lod_index: index,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{CommandBuffer, PresentationCommand};
    use hz_core::TerrainConfig;
    use std::thread;
    use std::time::{Duration, Instant};

    const LEVELS: [LodInfo; 3] = [
        LodInfo::new(0, 20.0, true),
        LodInfo::new(1, 40.0, false),
        LodInfo::new(2, 60.0, false),
    ];

    fn service() -> GenerationService<ChunkCoord, MeshTicket> {
        GenerationService::new(TerrainConfig {
            map_chunk_size: 11,
            worker_threads: 2,
            ..Default::default()
        })
        .unwrap()
    }

    fn wait_for_completed(service: &GenerationService<ChunkCoord, MeshTicket>, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(20);
        while service.stats().completed() < expected {
            assert!(Instant::now() < deadline, "workers did not finish in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn chunk_with_map_data(
        service: &GenerationService<ChunkCoord, MeshTicket>,
        sink: &mut CommandBuffer,
    ) -> TerrainChunk {
        let mut chunk = TerrainChunk::new(ChunkCoord::new(0, 0), 10.0, 1.0, &LEVELS, service, sink);
        wait_for_completed(service, 1);
        let mut map = None;
        service.drain_map_data(|_, data| map = Some(data));
        chunk.map_data = map;
        chunk
    }

    #[test]
    fn new_chunk_spawns_hidden_and_requests_map_data() {
        let service = service();
        let mut sink = CommandBuffer::new();
        let chunk = TerrainChunk::new(ChunkCoord::new(2, -1), 10.0, 2.0, &LEVELS, &service, &mut sink);

        assert_eq!(chunk.position(), Vec2::new(20.0, -10.0));
        assert!(!chunk.is_visible());
        assert_eq!(service.stats().map_requested(), 1);
        match &sink.commands()[0] {
            PresentationCommand::SpawnChunk { position, scale, .. } => {
                assert_eq!(*position, Vec3::new(40.0, 0.0, -20.0));
                assert_eq!(*scale, 2.0);
            }
            other => panic!("expected spawn, got {:?}", other),
        }
        assert!(matches!(
            sink.commands()[1],
            PresentationCommand::ChunkVisibility { visible: false, .. }
        ));
    }

    #[test]
    fn refresh_without_map_data_does_nothing() {
        let service = service();
        let mut sink = CommandBuffer::new();
        let mut chunk = TerrainChunk::new(ChunkCoord::new(0, 0), 10.0, 1.0, &LEVELS, &service, &mut sink);
        sink.clear();

        let mut visible = Vec::new();
        chunk.refresh(&mut RefreshContext {
            viewer_position: Vec2::ZERO,
            max_view_distance: 60.0,
            service: &service,
            visible_last_update: &mut visible,
            sink: &mut sink,
        });
        assert!(sink.is_empty());
        assert!(visible.is_empty());
        assert_eq!(service.stats().mesh_requested(), 0);
    }

    #[test]
    fn lod_follows_distance_thresholds() {
        let service = service();
        let mut sink = CommandBuffer::new();
        let chunk = chunk_with_map_data(&service, &mut sink);

        assert_eq!(chunk.select_lod_index(0.0), 0);
        assert_eq!(chunk.select_lod_index(20.0), 0);
        assert_eq!(chunk.select_lod_index(20.5), 1);
        assert_eq!(chunk.select_lod_index(45.0), 2);
        assert_eq!(chunk.select_lod_index(500.0), 2);
    }

    #[test]
    fn repeated_refresh_requests_one_mesh() {
        let service = service();
        let mut sink = CommandBuffer::new();
        let mut chunk = chunk_with_map_data(&service, &mut sink);

        let mut visible = Vec::new();
        for _ in 0..2 {
            chunk.refresh(&mut RefreshContext {
                viewer_position: Vec2::ZERO,
                max_view_distance: 60.0,
                service: &service,
                visible_last_update: &mut visible,
                sink: &mut sink,
            });
        }

        // LOD 0 doubles as the collider slot, so that shares the request too.
        assert_eq!(service.stats().mesh_requested(), 1);
        assert_eq!(visible, vec![ChunkCoord::new(0, 0)]);
        assert!(chunk.is_visible());
        assert!(chunk.current_mesh().is_none());
    }

    #[test]
    fn far_chunk_is_hidden_and_not_recorded() {
        let service = service();
        let mut sink = CommandBuffer::new();
        let mut chunk = chunk_with_map_data(&service, &mut sink);

        let mut visible = Vec::new();
        chunk.refresh(&mut RefreshContext {
            viewer_position: Vec2::new(500.0, 0.0),
            max_view_distance: 60.0,
            service: &service,
            visible_last_update: &mut visible,
            sink: &mut sink,
        });
        assert!(!chunk.is_visible());
        assert!(visible.is_empty());
        assert_eq!(service.stats().mesh_requested(), 0);
    }

    #[test]
    fn arrived_mesh_is_shown_and_used_as_collider() {
        let service = service();
        let mut sink = CommandBuffer::new();
        let mut chunk = chunk_with_map_data(&service, &mut sink);
        let mut visible = Vec::new();

        chunk.refresh(&mut RefreshContext {
            viewer_position: Vec2::ZERO,
            max_view_distance: 60.0,
            service: &service,
            visible_last_update: &mut visible,
            sink: &mut sink,
        });
        wait_for_completed(&service, 2);

        let mut meshes = Vec::new();
        service.drain_mesh_data(|ticket, mesh| meshes.push((ticket, mesh)));
        assert_eq!(meshes.len(), 1);
        let (ticket, mesh) = meshes.remove(0);
        assert_eq!(ticket.lod_index, 0);

        sink.clear();
        chunk.on_mesh_data_received(
            ticket.lod_index,
            mesh,
            &mut RefreshContext {
                viewer_position: Vec2::ZERO,
                max_view_distance: 60.0,
                service: &service,
                visible_last_update: &mut visible,
                sink: &mut sink,
            },
        );

        assert_eq!(chunk.current_lod_index(), Some(0));
        let shown = chunk.current_mesh().unwrap();
        let collider = chunk.collider_mesh().unwrap();
        assert!(Arc::ptr_eq(shown, collider), "collider should reuse the LOD 0 mesh");
        assert!(sink
            .commands()
            .iter()
            .any(|c| matches!(c, PresentationCommand::ChunkMesh { lod_index: 0, .. })));
        assert!(sink
            .commands()
            .iter()
            .any(|c| matches!(c, PresentationCommand::ChunkCollider { .. })));
    }
}
