use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::curve::HeightCurve;
use crate::grid::Rgba;

/// Samples per chunk side at full resolution.
pub const MAP_CHUNK_SIZE: usize = 239;

/// Coarsest LOD the preview accepts.
pub const MAX_PREVIEW_LOD: u32 = 6;

/// What the preview draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawMode {
    NoiseMap,
    #[default]
    ColorMap,
    Mesh,
    FalloffMap,
}

/// How raw octave sums are rescaled into heights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizeMode {
    /// Per-grid min/max. Exact [0, 1] but chunks disagree at their seams.
    Local,
    /// Against the estimated maximum amplitude. Seamless across chunks.
    #[default]
    Global,
}

/// Parameters for one noise field generation call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseParameters {
    pub seed: i32,
    pub scale: f32,
    pub octaves: i32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub offset: Vec2,
    pub normalize_mode: NormalizeMode,
}

/// Named height band with its display colour.
///
/// `height` is the lower bound of the band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainType {
    pub name: String,
    pub height: f32,
    pub color: Rgba,
}

impl TerrainType {
    pub fn new(name: impl Into<String>, height: f32, color: Rgba) -> Self {
        Self {
            name: name.into(),
            height,
            color,
        }
    }
}

/// One level of detail and the distance up to which it is used.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodInfo {
    /// 0 is full resolution; each step doubles the sample stride.
    pub lod: u32,
    pub visible_distance_threshold: f32,
    #[serde(default)]
    pub use_for_collider: bool,
}

impl LodInfo {
    pub const fn new(lod: u32, visible_distance_threshold: f32, use_for_collider: bool) -> Self {
        Self {
            lod,
            visible_distance_threshold,
            use_for_collider,
        }
    }
}

/// Full terrain generation and streaming configuration.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub draw_mode: DrawMode,
    pub normalize_mode: NormalizeMode,
    /// Samples per chunk side; the chunk spans `map_chunk_size - 1` units.
    pub map_chunk_size: usize,
    pub preview_lod: u32,
    pub noise_scale: f32,
    pub octaves: i32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub seed: i32,
    pub offset: [f32; 2],
    pub use_falloff: bool,
    pub height_multiplier: f32,
    pub height_curve: HeightCurve,
    pub regions: Vec<TerrainType>,
    pub detail_levels: Vec<LodInfo>,
    /// Viewer travel needed before visible chunks are recomputed.
    pub viewer_move_threshold: f32,
    pub world_scale: f32,
    /// Worker pool size; 0 uses one thread per CPU.
    pub worker_threads: usize,
}

impl TerrainConfig {
    /// Clamp out-of-range values in place. Never fails.
    pub fn validate(&mut self) {
        if self.lacunarity < 1.0 {
            self.lacunarity = 1.0;
        }
        if self.octaves < 0 {
            self.octaves = 0;
        }
        self.persistence = self.persistence.clamp(0.0, 1.0);
        self.preview_lod = self.preview_lod.min(MAX_PREVIEW_LOD);
        if self.map_chunk_size < 3 {
            self.map_chunk_size = 3;
        }
        if !(self.world_scale > 0.0) {
            self.world_scale = 1.0;
        }
        self.viewer_move_threshold = self.viewer_move_threshold.max(0.0);
    }

    pub fn validated(mut self) -> Self {
        self.validate();
        self
    }

    /// World-space side length of one chunk.
    pub fn chunk_size(&self) -> usize {
        self.map_chunk_size - 1
    }

    /// Farthest distance at which any chunk is shown.
    pub fn max_view_distance(&self) -> f32 {
        self.detail_levels
            .last()
            .map(|level| level.visible_distance_threshold)
            .unwrap_or(0.0)
    }

    /// Noise parameters for a chunk sampled around `center`.
    pub fn noise_parameters(&self, center: Vec2) -> NoiseParameters {
        NoiseParameters {
            seed: self.seed,
            scale: self.noise_scale,
            octaves: self.octaves,
            persistence: self.persistence,
            lacunarity: self.lacunarity,
            offset: center + Vec2::from(self.offset),
            normalize_mode: self.normalize_mode,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            draw_mode: DrawMode::default(),
            normalize_mode: NormalizeMode::default(),
            map_chunk_size: MAP_CHUNK_SIZE,
            preview_lod: 0,
            noise_scale: 25.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            seed: 0,
            offset: [0.0, 0.0],
            use_falloff: false,
            height_multiplier: 25.0,
            height_curve: HeightCurve::default(),
            regions: default_regions(),
            detail_levels: vec![
                LodInfo::new(0, 200.0, true),
                LodInfo::new(1, 400.0, false),
                LodInfo::new(4, 600.0, false),
            ],
            viewer_move_threshold: 25.0,
            world_scale: 1.0,
            worker_threads: 0,
        }
    }
}

fn default_regions() -> Vec<TerrainType> {
    vec![
        TerrainType::new("Water Deep", 0.0, [50, 99, 195, 255]),
        TerrainType::new("Water Shallow", 0.3, [54, 103, 199, 255]),
        TerrainType::new("Sand", 0.4, [210, 208, 125, 255]),
        TerrainType::new("Grass", 0.45, [86, 152, 23, 255]),
        TerrainType::new("Grass 2", 0.55, [62, 107, 18, 255]),
        TerrainType::new("Rock", 0.6, [90, 69, 60, 255]),
        TerrainType::new("Rock 2", 0.7, [75, 60, 53, 255]),
        TerrainType::new("Snow", 0.9, [255, 255, 255, 255]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_clamps_ranges() {
        let mut config = TerrainConfig {
            lacunarity: 0.25,
            octaves: -3,
            persistence: 1.7,
            preview_lod: 11,
            ..Default::default()
        };
        config.validate();
        assert_eq!(config.lacunarity, 1.0);
        assert_eq!(config.octaves, 0);
        assert_eq!(config.persistence, 1.0);
        assert_eq!(config.preview_lod, MAX_PREVIEW_LOD);
    }

    #[test]
    fn default_tables_are_well_formed() {
        let config = TerrainConfig::default();
        assert_eq!(config.regions[0].height, 0.0);
        assert!(config
            .regions
            .windows(2)
            .all(|pair| pair[0].height <= pair[1].height));
        assert_eq!(
            config.detail_levels.iter().filter(|l| l.use_for_collider).count(),
            1
        );
        assert_eq!(config.max_view_distance(), 600.0);
        assert_eq!(config.chunk_size(), 238);
    }

    #[test]
    fn noise_parameters_add_config_offset() {
        let config = TerrainConfig {
            offset: [5.0, -2.0],
            ..Default::default()
        };
        let params = config.noise_parameters(Vec2::new(238.0, 0.0));
        assert_eq!(params.offset, Vec2::new(243.0, -2.0));
        assert_eq!(params.octaves, config.octaves);
    }
}
