use hz_core::HeightGrid;

const CURVE_POWER: f32 = 3.0;
const CURVE_SHIFT: f32 = 2.2;

/// Square island mask: near 0 in the centre, rising to 1 at the edges.
///
/// Depends only on `size`.
pub fn generate_falloff_map(size: usize) -> HeightGrid {
    HeightGrid::from_fn(size, size, |i, j| {
        let x = i as f32 / size as f32 * 2.0 - 1.0;
        let y = j as f32 / size as f32 * 2.0 - 1.0;
        evaluate(x.abs().max(y.abs()))
    })
}

fn evaluate(value: f32) -> f32 {
    let a = value.powf(CURVE_POWER);
    let b = (CURVE_SHIFT - CURVE_SHIFT * value).powf(CURVE_POWER);
    (a / (a + b)).clamp(0.0, 1.0)
}
