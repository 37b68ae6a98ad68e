use bevy::math::Vec2;
use hz_core::{HeightGrid, NoiseParameters, NormalizeMode};
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Scale substituted for non-positive input.
pub const MIN_SCALE: f32 = 0.0001;

/// Octave offsets are drawn from `[-OCTAVE_OFFSET_RANGE, OCTAVE_OFFSET_RANGE)`.
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Divisor applied to the theoretical maximum; octave sums rarely get
/// within a factor of 1.75 of it.
const GLOBAL_AMPLITUDE_FACTOR: f32 = 1.75;

/// Multi-octave Perlin field with seeded per-octave offsets.
pub struct NoiseField {
    perlin: Perlin,
    octave_offsets: Vec<Vec2>,
    scale: f64,
    persistence: f64,
    lacunarity: f64,
    /// Sum of all octave amplitudes.
    max_possible_height: f32,
}

impl NoiseField {
    pub fn new(params: &NoiseParameters) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed as i64 as u64);
        let octaves = params.octaves.max(0) as usize;
        let persistence = params.persistence;
        let lacunarity = params.lacunarity.max(1.0);

        let mut octave_offsets = Vec::with_capacity(octaves);
        let mut max_possible_height = 0.0;
        let mut amplitude = 1.0;
        for _ in 0..octaves {
            let offset_x = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32 + params.offset.x;
            // y runs against the mesh's +z axis
            let offset_y = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32 - params.offset.y;
            octave_offsets.push(Vec2::new(offset_x, offset_y));

            max_possible_height += amplitude;
            amplitude *= persistence;
        }

        let scale = if params.scale <= 0.0 { MIN_SCALE } else { params.scale };

        Self {
            perlin: Perlin::new(params.seed as u32),
            octave_offsets,
            scale: scale as f64,
            persistence: persistence as f64,
            lacunarity: lacunarity as f64,
            max_possible_height,
        }
    }

    /// Raw octave sum at a grid-space position (already centred on the grid).
    pub fn sample(&self, x: f64, y: f64) -> f32 {
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut value = 0.0;

        for offset in &self.octave_offsets {
            let sample_x = (x + offset.x as f64) / self.scale * frequency;
            let sample_y = (y + offset.y as f64) / self.scale * frequency;
            value += self.perlin.get([sample_x, sample_y]) * amplitude;

            amplitude *= self.persistence;
            frequency *= self.lacunarity;
        }

        value as f32
    }

    /// Globally normalised height; stable across grids but not bounded above.
    pub fn normalize_global(&self, value: f32) -> f32 {
        if self.max_possible_height <= 0.0 {
            return 0.0;
        }
        let normalized = (value + 1.0) / (2.0 * self.max_possible_height / GLOBAL_AMPLITUDE_FACTOR);
        normalized.max(0.0)
    }
}

/// Generate a `width` x `height` grid of normalised noise.
///
/// Samples are centred on the grid midpoint, so `params.offset` is the world
/// position of the grid centre. Identical parameters always produce identical
/// grids.
pub fn generate_noise_map(width: usize, height: usize, params: &NoiseParameters) -> HeightGrid {
    let field = NoiseField::new(params);
    let half_width = width as f64 / 2.0;
    let half_height = height as f64 / 2.0;

    let mut values: Vec<f32> = (0..width * height)
        .into_par_iter()
        .map(|idx| {
            let x = (idx % width) as f64;
            let y = (idx / width) as f64;
            field.sample(x - half_width, y - half_height)
        })
        .collect();

    match params.normalize_mode {
        NormalizeMode::Local => {
            let (min, max) = values
                .iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            let span = max - min;
            for value in &mut values {
                *value = if span > 0.0 { (*value - min) / span } else { 0.0 };
            }
        }
        NormalizeMode::Global => {
            for value in &mut values {
                *value = field.normalize_global(*value);
            }
        }
    }

    HeightGrid { width, height, values }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(mode: NormalizeMode) -> NoiseParameters {
        NoiseParameters {
            seed: 42,
            scale: 27.3,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: Vec2::new(13.0, -7.0),
            normalize_mode: mode,
        }
    }

    #[test]
    fn generation_is_deterministic() {
        for mode in [NormalizeMode::Local, NormalizeMode::Global] {
            let a = generate_noise_map(33, 33, &params(mode));
            let b = generate_noise_map(33, 33, &params(mode));
            assert_eq!(a, b, "{:?} grids differ", mode);
        }
    }

    #[test]
    fn seed_changes_output() {
        let a = generate_noise_map(17, 17, &params(NormalizeMode::Global));
        let b = generate_noise_map(17, 17, &NoiseParameters { seed: 43, ..params(NormalizeMode::Global) });
        assert_ne!(a, b);
    }

    #[test]
    fn local_mode_spans_unit_interval() {
        let grid = generate_noise_map(41, 41, &params(NormalizeMode::Local));
        assert!(grid.values.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(grid.values.iter().any(|&v| v == 1.0), "no sample reached 1.0");
        assert!(grid.values.iter().any(|&v| v == 0.0), "no sample reached 0.0");
    }

    #[test]
    fn global_mode_is_non_negative() {
        let grid = generate_noise_map(41, 41, &params(NormalizeMode::Global));
        assert!(grid.values.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn global_mode_matches_across_neighbouring_grids() {
        // Two grids one unit apart overlap in all but one column.
        let base = params(NormalizeMode::Global);
        let left = generate_noise_map(20, 10, &base);
        let shifted = NoiseParameters {
            offset: base.offset + Vec2::new(1.0, 0.0),
            ..base
        };
        let right = generate_noise_map(20, 10, &shifted);
        for y in 0..10 {
            for x in 0..19 {
                assert_eq!(left.get(x + 1, y), right.get(x, y), "mismatch at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn non_positive_scale_is_clamped() {
        let grid = generate_noise_map(9, 9, &NoiseParameters { scale: 0.0, ..params(NormalizeMode::Global) });
        assert!(grid.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn zero_octaves_is_flat() {
        let grid = generate_noise_map(5, 5, &NoiseParameters { octaves: 0, ..params(NormalizeMode::Local) });
        assert!(grid.values.iter().all(|&v| v == 0.0));
    }
}
