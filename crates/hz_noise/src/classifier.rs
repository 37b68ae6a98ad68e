use hz_core::{ColorGrid, HeightGrid, TerrainType};

/// Index of the highest band whose threshold `height` reaches.
///
/// The table is scanned in order and the scan stops at the first band the
/// height falls short of, so thresholds are expected to ascend.
pub fn classify(height: f32, regions: &[TerrainType]) -> Option<usize> {
    let mut selected = None;
    for (index, region) in regions.iter().enumerate() {
        if height >= region.height {
            selected = Some(index);
        } else {
            break;
        }
    }
    selected
}

/// Subtract the falloff mask from the interior of a bordered height grid.
///
/// `falloff` covers the interior only; border samples are left as they are.
pub fn apply_falloff(heights: &mut HeightGrid, falloff: &HeightGrid) {
    for y in 0..falloff.height.min(heights.height.saturating_sub(2)) {
        for x in 0..falloff.width.min(heights.width.saturating_sub(2)) {
            let value = heights.get(x + 1, y + 1) - falloff.get(x, y);
            heights.set(x + 1, y + 1, value.clamp(0.0, 1.0));
        }
    }
}

/// Colour every interior sample of a bordered height grid.
pub fn classify_grid(heights: &HeightGrid, regions: &[TerrainType]) -> ColorGrid {
    let width = heights.width.saturating_sub(2);
    let height = heights.height.saturating_sub(2);
    let mut colors = ColorGrid::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let sample = heights.get(x + 1, y + 1);
            colors.set(x, y, classify(sample, regions).map(|i| regions[i].color));
        }
    }

    colors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions() -> Vec<TerrainType> {
        vec![
            TerrainType::new("Water", 0.0, [0, 0, 255, 255]),
            TerrainType::new("Sand", 0.4, [255, 255, 0, 255]),
            TerrainType::new("Grass", 0.5, [0, 255, 0, 255]),
            TerrainType::new("Snow", 0.9, [255, 255, 255, 255]),
        ]
    }

    #[test]
    fn picks_highest_reached_band() {
        let table = regions();
        assert_eq!(classify(0.0, &table), Some(0));
        assert_eq!(classify(0.39, &table), Some(0));
        assert_eq!(classify(0.4, &table), Some(1));
        assert_eq!(classify(0.75, &table), Some(2));
        assert_eq!(classify(1.0, &table), Some(3));
    }

    #[test]
    fn classification_is_monotonic() {
        let table = regions();
        let mut previous = None;
        for step in 0..=100 {
            let rank = classify(step as f32 / 100.0, &table);
            assert!(rank >= previous, "rank dropped at {}", step);
            previous = rank;
        }
    }

    #[test]
    fn below_every_threshold_is_unclassified() {
        let table = vec![TerrainType::new("Hill", 0.5, [1, 1, 1, 255])];
        let heights = HeightGrid::from_fn(4, 4, |x, _| x as f32 * 0.3);
        let colors = classify_grid(&heights, &table);
        assert_eq!((colors.width, colors.height), (2, 2));
        // Interior column 0 is sample x = 1 (0.3), column 1 is x = 2 (0.6).
        assert_eq!(colors.get(0, 0), None);
        assert_eq!(colors.get(1, 1), Some([1, 1, 1, 255]));
        assert_eq!(colors.unclassified(), 2);
    }

    #[test]
    fn falloff_lowers_interior_only() {
        let mut heights = HeightGrid::from_fn(4, 4, |_, _| 0.5);
        let falloff = HeightGrid::from_fn(2, 2, |_, _| 0.75);
        apply_falloff(&mut heights, &falloff);
        assert_eq!(heights.get(1, 1), 0.0);
        assert_eq!(heights.get(2, 2), 0.0);
        assert_eq!(heights.get(0, 0), 0.5);
        assert_eq!(heights.get(3, 1), 0.5);
    }
}
