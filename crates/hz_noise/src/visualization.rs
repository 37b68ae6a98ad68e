use hz_core::{ColorGrid, HeightGrid};

/// Colour written for cells no terrain band claimed.
const UNCLASSIFIED: [u8; 4] = [0, 0, 0, 0];

/// Convert a grayscale value to RGBA.
pub fn grayscale_to_rgba(value: f32, min: f32, max: f32) -> [u8; 4] {
    let normalized = ((value - min) / (max - min)).clamp(0.0, 1.0);
    let gray = (normalized * 255.0) as u8;
    [gray, gray, gray, 255]
}

/// Black-to-white texture bytes for a height grid in `[0, 1]`.
pub fn height_grid_to_rgba(grid: &HeightGrid) -> Vec<u8> {
    grid.values
        .iter()
        .flat_map(|&v| grayscale_to_rgba(v, 0.0, 1.0))
        .collect()
}

/// Texture bytes for a colour grid.
pub fn color_grid_to_rgba(grid: &ColorGrid) -> Vec<u8> {
    grid.colors
        .iter()
        .flat_map(|c| c.unwrap_or(UNCLASSIFIED))
        .collect()
}
