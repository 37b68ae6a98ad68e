use bevy::math::Vec2;
use hz_core::{ColorGrid, HeightGrid, TerrainConfig};

use crate::classifier::{apply_falloff, classify_grid};
use crate::falloff::generate_falloff_map;
use crate::noise_field::generate_noise_map;

/// Generated terrain data for one chunk.
///
/// `height_map` carries a one-sample border on every side; `color_map`
/// covers the interior only.
#[derive(Clone, Debug, PartialEq)]
pub struct MapData {
    pub height_map: HeightGrid,
    pub color_map: ColorGrid,
}

/// Validated configuration plus the falloff mask derived from it.
///
/// Immutable once built; a configuration change builds a new generator.
#[derive(Clone, Debug)]
pub struct MapGenerator {
    config: TerrainConfig,
    falloff: HeightGrid,
}

impl MapGenerator {
    pub fn new(config: TerrainConfig) -> Self {
        let config = config.validated();
        let falloff = generate_falloff_map(config.map_chunk_size);
        Self { config, falloff }
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn falloff(&self) -> &HeightGrid {
        &self.falloff
    }

    /// Noise, falloff and classification for the chunk centred at `center`.
    pub fn generate(&self, center: Vec2) -> MapData {
        let size = self.config.map_chunk_size;
        let params = self.config.noise_parameters(center);
        let mut height_map = generate_noise_map(size + 2, size + 2, &params);

        if self.config.use_falloff {
            apply_falloff(&mut height_map, &self.falloff);
        }
        let color_map = classify_grid(&height_map, &self.config.regions);

        MapData {
            height_map,
            color_map,
        }
    }
}

impl Default for MapGenerator {
    fn default() -> Self {
        Self::new(TerrainConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hz_core::NormalizeMode;

    fn small_config() -> TerrainConfig {
        TerrainConfig {
            map_chunk_size: 31,
            ..Default::default()
        }
    }

    #[test]
    fn map_data_has_bordered_heights() {
        let generator = MapGenerator::new(small_config());
        let data = generator.generate(Vec2::ZERO);
        assert_eq!((data.height_map.width, data.height_map.height), (33, 33));
        assert_eq!((data.color_map.width, data.color_map.height), (31, 31));
        // Default regions start at 0, so every cell is coloured.
        assert_eq!(data.color_map.unclassified(), 0);
    }

    #[test]
    fn generator_validates_its_config() {
        let generator = MapGenerator::new(TerrainConfig {
            lacunarity: 0.1,
            octaves: -2,
            ..small_config()
        });
        assert_eq!(generator.config().lacunarity, 1.0);
        assert_eq!(generator.config().octaves, 0);
    }

    #[test]
    fn falloff_pulls_interior_down() {
        let plain = MapGenerator::new(TerrainConfig {
            normalize_mode: NormalizeMode::Local,
            ..small_config()
        });
        let island = MapGenerator::new(TerrainConfig {
            use_falloff: true,
            ..plain.config().clone()
        });
        let a = plain.generate(Vec2::ZERO);
        let b = island.generate(Vec2::ZERO);
        for y in 1..32 {
            for x in 1..32 {
                assert!(b.height_map.get(x, y) <= a.height_map.get(x, y));
            }
        }
    }
}
