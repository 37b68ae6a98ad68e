pub mod classifier;
pub mod falloff;
pub mod map_data;
pub mod noise_field;
pub mod visualization;

pub use classifier::{apply_falloff, classify, classify_grid};
pub use falloff::generate_falloff_map;
pub use map_data::{MapData, MapGenerator};
pub use noise_field::{generate_noise_map, NoiseField};
pub use visualization::{color_grid_to_rgba, grayscale_to_rgba, height_grid_to_rgba};
