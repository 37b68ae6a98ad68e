use bevy::log::info;
use bevy::math::Vec2;
use hz_core::TerrainConfig;
use hz_mesh::{build_terrain_mesh, MeshData};
use hz_noise::{MapData, MapGenerator};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Error type for setting up the generation service.
#[derive(Debug)]
pub enum GenerationError {
    WorkerPool(rayon::ThreadPoolBuildError),
}

impl From<rayon::ThreadPoolBuildError> for GenerationError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::WorkerPool(err)
    }
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WorkerPool(e) => write!(f, "failed to build worker pool: {}", e),
        }
    }
}

impl std::error::Error for GenerationError {}

/// Mutex-guarded FIFO of finished results.
///
/// Workers push; the owning thread takes everything at once.
pub struct ResultQueue<T> {
    entries: Mutex<VecDeque<T>>,
}

impl<T> ResultQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, entry: T) {
        // A panicking worker cannot leave a half-written entry behind.
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(entry);
    }

    /// Empty the queue, returning its entries in arrival order.
    pub fn take_all(&self) -> VecDeque<T> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *entries)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for ResultQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock-free request accounting shared with the workers.
#[derive(Default)]
pub struct GenerationStats {
    map_requested: AtomicUsize,
    map_completed: AtomicUsize,
    map_delivered: AtomicUsize,
    mesh_requested: AtomicUsize,
    mesh_completed: AtomicUsize,
    mesh_delivered: AtomicUsize,
}

impl GenerationStats {
    pub fn map_requested(&self) -> usize {
        self.map_requested.load(Ordering::Relaxed)
    }

    pub fn mesh_requested(&self) -> usize {
        self.mesh_requested.load(Ordering::Relaxed)
    }

    /// Jobs whose result is sitting in a queue or already delivered.
    pub fn completed(&self) -> usize {
        self.map_completed.load(Ordering::Acquire) + self.mesh_completed.load(Ordering::Acquire)
    }

    pub fn delivered(&self) -> usize {
        self.map_delivered.load(Ordering::Relaxed) + self.mesh_delivered.load(Ordering::Relaxed)
    }

    /// Requests issued but not yet handed back to the owning thread.
    pub fn pending(&self) -> usize {
        (self.map_requested() + self.mesh_requested()).saturating_sub(self.delivered())
    }
}

struct ThreadInfo<T, P> {
    tag: T,
    parameter: P,
}

/// Runs map and mesh generation on a bounded worker pool.
///
/// Each request carries a tag that is handed back with its result. Results
/// only reach the caller through [`drain_map_data`](Self::drain_map_data) and
/// [`drain_mesh_data`](Self::drain_mesh_data), which must be called from the
/// thread that owns the service.
pub struct GenerationService<M, R = M> {
    generator: Arc<MapGenerator>,
    pool: rayon::ThreadPool,
    map_queue: Arc<ResultQueue<ThreadInfo<M, Arc<MapData>>>>,
    mesh_queue: Arc<ResultQueue<ThreadInfo<R, Arc<MeshData>>>>,
    stats: Arc<GenerationStats>,
}

impl<M, R> GenerationService<M, R>
where
    M: Send + 'static,
    R: Send + 'static,
{
    pub fn new(config: TerrainConfig) -> Result<Self, GenerationError> {
        let generator = MapGenerator::new(config);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(generator.config().worker_threads)
            .thread_name(|i| format!("terrain-worker-{}", i))
            .build()?;
        info!("Created terrain worker pool with {} threads", pool.current_num_threads());

        Ok(Self {
            generator: Arc::new(generator),
            pool,
            map_queue: Arc::new(ResultQueue::new()),
            mesh_queue: Arc::new(ResultQueue::new()),
            stats: Arc::new(GenerationStats::default()),
        })
    }

    /// Swap in new settings. Requests already issued keep the old ones.
    pub fn update_config(&mut self, config: TerrainConfig) {
        self.generator = Arc::new(MapGenerator::new(config));
        info!("Terrain generation settings updated (seed {})", self.generator.config().seed);
    }

    pub fn generator(&self) -> &Arc<MapGenerator> {
        &self.generator
    }

    pub fn config(&self) -> &TerrainConfig {
        self.generator.config()
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    /// Generate map data for the chunk centred at `center` off-thread.
    pub fn request_map_data(&self, center: Vec2, tag: M) {
        let generator = Arc::clone(&self.generator);
        let queue = Arc::clone(&self.map_queue);
        let stats = Arc::clone(&self.stats);
        stats.map_requested.fetch_add(1, Ordering::Relaxed);

        self.pool.spawn_fifo(move || {
            let map_data = generator.generate(center);
            queue.push(ThreadInfo {
                tag,
                parameter: Arc::new(map_data),
            });
            stats.map_completed.fetch_add(1, Ordering::Release);
        });
    }

    /// Build the mesh for `map_data` at `lod` off-thread.
    pub fn request_mesh_data(&self, map_data: Arc<MapData>, lod: u32, tag: R) {
        let generator = Arc::clone(&self.generator);
        let queue = Arc::clone(&self.mesh_queue);
        let stats = Arc::clone(&self.stats);
        stats.mesh_requested.fetch_add(1, Ordering::Relaxed);

        self.pool.spawn_fifo(move || {
            let config = generator.config();
            let mesh_data = build_terrain_mesh(
                &map_data.height_map,
                config.height_multiplier,
                &config.height_curve,
                lod,
            );
            queue.push(ThreadInfo {
                tag,
                parameter: Arc::new(mesh_data),
            });
            stats.mesh_completed.fetch_add(1, Ordering::Release);
        });
    }

    /// Hand every finished map result to `on_done`, oldest first.
    pub fn drain_map_data(&self, mut on_done: impl FnMut(M, Arc<MapData>)) -> usize {
        let entries = self.map_queue.take_all();
        let count = entries.len();
        for info in entries {
            self.stats.map_delivered.fetch_add(1, Ordering::Relaxed);
            on_done(info.tag, info.parameter);
        }
        count
    }

    /// Hand every finished mesh result to `on_done`, oldest first.
    pub fn drain_mesh_data(&self, mut on_done: impl FnMut(R, Arc<MeshData>)) -> usize {
        let entries = self.mesh_queue.take_all();
        let count = entries.len();
        for info in entries {
            self.stats.mesh_delivered.fetch_add(1, Ordering::Relaxed);
            on_done(info.tag, info.parameter);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    fn config(worker_threads: usize) -> TerrainConfig {
        TerrainConfig {
            map_chunk_size: 21,
            worker_threads,
            ..Default::default()
        }
    }

    fn wait_for_completed<M: Send + 'static, R: Send + 'static>(
        service: &GenerationService<M, R>,
        expected: usize,
    ) {
        let deadline = Instant::now() + Duration::from_secs(20);
        while service.stats().completed() < expected {
            assert!(Instant::now() < deadline, "workers did not finish in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn result_queue_is_fifo() {
        let queue = ResultQueue::new();
        for i in 0..4 {
            queue.push(i);
        }
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.take_all().into_iter().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn results_wait_for_drain() {
        let service: GenerationService<u32> = GenerationService::new(config(2)).unwrap();
        service.request_map_data(Vec2::ZERO, 7);
        wait_for_completed(&service, 1);
        assert_eq!(service.stats().pending(), 1);

        let mut received = Vec::new();
        let count = service.drain_map_data(|tag, data| received.push((tag, data)));
        assert_eq!(count, 1);
        assert_eq!(received[0].0, 7);
        assert_eq!(received[0].1.color_map.width, 21);
        assert_eq!(service.stats().pending(), 0);
        assert_eq!(service.drain_map_data(|_, _| panic!("delivered twice")), 0);
    }

    #[test]
    fn single_worker_delivers_in_request_order() {
        let service: GenerationService<usize> = GenerationService::new(config(1)).unwrap();
        for i in 0..6 {
            service.request_map_data(Vec2::new(i as f32 * 20.0, 0.0), i);
        }
        wait_for_completed(&service, 6);

        let mut order = Vec::new();
        service.drain_map_data(|tag, _| order.push(tag));
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn mesh_requests_use_their_own_queue() {
        let service: GenerationService<(), &'static str> = GenerationService::new(config(2)).unwrap();
        let data = Arc::new(service.generator().generate(Vec2::ZERO));
        service.request_mesh_data(Arc::clone(&data), 1, "lod1");
        wait_for_completed(&service, 1);

        assert_eq!(service.drain_map_data(|_, _| {}), 0);
        let mut meshes = Vec::new();
        service.drain_mesh_data(|tag, mesh| meshes.push((tag, mesh)));
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].0, "lod1");
        assert_eq!(meshes[0].1.lod, 1);
        assert_eq!(service.stats().mesh_requested(), 1);
    }

    #[test]
    fn requests_keep_settings_from_issue_time() {
        let before = config(1);
        let mut service: GenerationService<u8> = GenerationService::new(before.clone()).unwrap();
        let center = Vec2::new(40.0, -20.0);
        service.request_map_data(center, 0);
        service.update_config(TerrainConfig {
            seed: 99,
            ..before.clone()
        });
        service.request_map_data(center, 1);
        wait_for_completed(&service, 2);

        let mut results = Vec::new();
        service.drain_map_data(|tag, data| results.push((tag, data)));
        let expected_old = MapGenerator::new(before.clone()).generate(center);
        let expected_new = MapGenerator::new(TerrainConfig { seed: 99, ..before }).generate(center);
        assert_eq!(*results[0].1, expected_old);
        assert_eq!(*results[1].1, expected_new);
    }
}
