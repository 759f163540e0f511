//! Rotation frames for the tunnel cross-section
//!
//! Face `k` of an N-gon is the down face rotated clockwise by `k` steps of
//! 2π/N (side indices increase to the player's left). Each face has a local
//! frame: x tangential along the face, y up away from the face toward the
//! tunnel axis, z along the tunnel. Frames are memoized per (sides, side)
//! key; the cache is invalidated only when the occupied descriptor changes
//! identity.

use glam::{Mat3, Vec3};
use std::collections::HashMap;
use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub local_to_world: Mat3,
    pub world_to_local: Mat3,
}

#[derive(Debug, Default)]
pub struct FrameCache {
    map: HashMap<(u32, u32), Frame>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&mut self, sides: u32, side: u32) -> Frame {
        *self.map.entry((sides, side)).or_insert_with(|| {
            let angle = side as f32 * TAU / sides as f32;
            Frame {
                local_to_world: Mat3::from_rotation_z(-angle),
                world_to_local: Mat3::from_rotation_z(angle),
            }
        })
    }

    pub fn local_to_world(&mut self, sides: u32, side: u32, local: Vec3) -> Vec3 {
        self.frame(sides, side).local_to_world * local
    }

    pub fn world_to_local(&mut self, sides: u32, side: u32, world: Vec3) -> Vec3 {
        self.frame(sides, side).world_to_local * world
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    #[cfg(test)]
    pub fn cached(&self) -> usize {
        self.map.len()
    }
}

/// Side arithmetic is mod-`sides` throughout: step the index with wrap.
#[inline]
pub fn side_step(sides: u32, side: u32, delta: i32) -> u32 {
    (side as i64 + delta as i64).rem_euclid(sides as i64) as u32
}

/// Rotation applied to the ball's local coordinates when it transfers to an
/// adjacent face: +1 steps left (side + 1), -1 steps right.
#[inline]
pub fn transfer_rotation(rotation_angle: f32, direction: i32) -> Mat3 {
    Mat3::from_rotation_z(direction as f32 * rotation_angle)
}
