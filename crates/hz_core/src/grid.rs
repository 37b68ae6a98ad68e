/// RGBA8 colour as used for classification and textures.
pub type Rgba = [u8; 4];

/// Row-major 2D grid of height samples.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightGrid {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f32>,
}

impl HeightGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y));
            }
        }
        Self { width, height, values }
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.values[y * self.width + x] = value;
    }
}

/// Classification colours for the interior samples of a chunk.
///
/// A `None` cell is a sample that fell below every terrain threshold.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorGrid {
    pub width: usize,
    pub height: usize,
    pub colors: Vec<Option<Rgba>>,
}

impl ColorGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            colors: vec![None; width * height],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgba> {
        self.colors[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, color: Option<Rgba>) {
        self.colors[y * self.width + x] = color;
    }

    /// Number of cells that received no colour.
    pub fn unclassified(&self) -> usize {
        self.colors.iter().filter(|c| c.is_none()).count()
    }
}
