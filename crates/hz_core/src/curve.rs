use serde::{Deserialize, Deserializer, Serialize};

/// Piecewise-linear height response curve over `[0, 1]`.
///
/// Keys are `(t, value)` pairs kept sorted by `t`. Outside the key range the
/// curve holds its end values. An empty curve is the identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeightCurve {
    #[serde(deserialize_with = "deserialize_sorted_keys")]
    keys: Vec<(f32, f32)>,
}

impl HeightCurve {
    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        sort_keys(&mut keys);
        Self { keys }
    }

    pub fn linear() -> Self {
        Self::new(vec![(0.0, 0.0), (1.0, 1.0)])
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return t;
        };
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }

        // First key strictly after t; there is always one before it here.
        let upper = self.keys.partition_point(|k| k.0 <= t);
        let (t0, v0) = self.keys[upper - 1];
        let (t1, v1) = self.keys[upper];
        let span = t1 - t0;
        if span <= f32::EPSILON {
            return v1;
        }
        v0 + (v1 - v0) * (t - t0) / span
    }
}

fn sort_keys(keys: &mut [(f32, f32)]) {
    keys.sort_by(|a, b| a.0.total_cmp(&b.0));
}

/// Files may list keys in any order.
fn deserialize_sorted_keys<'de, D>(deserializer: D) -> Result<Vec<(f32, f32)>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut keys = Vec::<(f32, f32)>::deserialize(deserializer)?;
    sort_keys(&mut keys);
    Ok(keys)
}

impl Default for HeightCurve {
    /// Flattens everything below 0.4 so water stays level.
    fn default() -> Self {
        Self::new(vec![(0.0, 0.0), (0.4, 0.0), (1.0, 1.0)])
    }
}
