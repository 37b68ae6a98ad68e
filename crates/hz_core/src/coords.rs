use bevy::math::bounding::Aabb2d;
use bevy::prelude::*;

/// Grid position of a terrain chunk in chunk-space coordinates.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Component)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing `position`, rounding to the nearest chunk centre.
    pub fn from_world(position: Vec2, chunk_size: f32) -> Self {
        Self {
            x: (position.x / chunk_size).round() as i32,
            y: (position.y / chunk_size).round() as i32,
        }
    }

    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// World-space centre of this chunk (before terrain scaling).
    pub fn world_center(&self, chunk_size: f32) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32) * chunk_size
    }
}

/// Square footprint of a chunk on the ground plane.
#[derive(Clone, Copy, Debug)]
pub struct ChunkBounds {
    aabb: Aabb2d,
}

impl ChunkBounds {
    pub fn new(center: Vec2, size: f32) -> Self {
        Self {
            aabb: Aabb2d::new(center, Vec2::splat(size / 2.0)),
        }
    }

    /// Distance from `point` to the nearest edge, zero when inside.
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.aabb.closest_point(point).distance(point)
    }
}
