//! Game session state and core ball types
//!
//! No hidden globals: the whole session lives in one `GameState` value that
//! the per-tick update takes by reference.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::frame::{side_step, transfer_rotation, FrameCache};
use super::level::LevelDescriptor;
use super::window::RowWindow;
use crate::config::TunnelConfig;

/// Ball contact tri-state: airborne, resting on a solid panel, or riding a
/// falling one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Contact {
    #[default]
    Airborne,
    Solid,
    Falling,
}

impl Contact {
    #[inline]
    pub fn is_grounded(self) -> bool {
        self != Contact::Airborne
    }
}

/// Last horizontal steering direction, kept for the multi-contact tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Steer {
    #[default]
    None,
    Left,
    Right,
}

impl Steer {
    /// Side-index step continuing this direction (left faces carry higher
    /// indices).
    #[inline]
    pub fn rotation_step(self) -> i32 {
        match self {
            Steer::None => 0,
            Steer::Left => 1,
            Steer::Right => -1,
        }
    }
}

/// The player's ball.
#[derive(Debug, Clone)]
pub struct BallState {
    /// Position in the current down face's local frame (x tangential, y above
    /// the face, z along the tunnel)
    pub pos: Vec3,
    /// Vertical velocity along the face normal (positive = away from face)
    pub vel_y: f32,
    pub accel_y: f32,
    pub is_jumping: bool,
    pub contact: Contact,
    /// Index of the tunnel face currently treated as "down"
    pub side: u32,
    pub steer: Steer,
    /// Visual roll angle
    pub spin: f32,
}

impl BallState {
    /// Ball at the configured spawn transform of a segment.
    pub fn spawn(desc: &LevelDescriptor) -> Self {
        Self {
            pos: desc.spawn_pos(),
            vel_y: 0.0,
            accel_y: 0.0,
            is_jumping: false,
            contact: Contact::Solid,
            side: 0,
            steer: Steer::None,
            spin: 0.0,
        }
    }

    pub fn world_pos(&self, frames: &mut FrameCache, sides: u32) -> Vec3 {
        frames.local_to_world(sides, self.side, self.pos)
    }

    /// Panel-to-panel rotation transfer: step the down face and rotate the
    /// local coordinates into the new face's frame. World position is
    /// preserved exactly.
    pub fn transfer(&mut self, desc: &LevelDescriptor, direction: i32) {
        self.side = side_step(desc.sides, self.side, direction);
        self.pos = transfer_rotation(desc.rotation_angle(), direction) * self.pos;
    }
}

/// Run statistics for the session report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Distance scrolled through the tunnel
    pub distance: f32,
    pub rows_crossed: u64,
    pub levels_entered: u64,
    pub resets: u32,
    pub time_ticks: u64,
}

/// Complete game session state.
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub window: RowWindow,
    /// Memoized rotation frames, invalidated on level identity change
    pub frames: FrameCache,
    pub ball: BallState,
    /// Id of the level segment the ball currently occupies
    pub occupied_level: u64,
    /// Smoothed camera roll toward the current rotation side
    pub camera_roll: f32,
    /// Camera transform published to the renderer each tick
    pub camera: Mat4,
    pub stats: RunStats,
}

impl GameState {
    pub fn new(config: &TunnelConfig, seed: u64) -> Self {
        log::info!("New session, seed {seed}");
        Self::from_window(RowWindow::new(config, seed), seed)
    }

    /// Start a session over a pre-built window (scripted levels).
    pub fn from_window(window: RowWindow, seed: u64) -> Self {
        let desc = window.level_for_row(0);
        let ball = BallState::spawn(desc);
        let occupied_level = desc.id;
        Self {
            seed,
            ball,
            occupied_level,
            window,
            frames: FrameCache::new(),
            camera_roll: 0.0,
            camera: Mat4::IDENTITY,
            stats: RunStats::default(),
        }
    }

    /// Descriptor of the level the ball currently occupies.
    pub fn occupied_desc(&self) -> &LevelDescriptor {
        for i in 0..self.window.len() {
            let desc = self.window.level_for_row(i);
            if desc.id == self.occupied_level {
                return desc;
            }
        }
        self.window.level_for_row(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{BALL_RADIUS, BALL_Z};

    fn desc() -> LevelDescriptor {
        LevelDescriptor::new(0, 6, 2, 2.0, 10.0, 5.0, 0.5, [1.0; 4]).unwrap()
    }

    #[test]
    fn test_spawn_rests_on_down_face() {
        let d = desc();
        let b = BallState::spawn(&d);
        assert_eq!(b.side, 0);
        assert_eq!(b.contact, Contact::Solid);
        assert!((b.pos.y - (d.pane_start_y() + BALL_RADIUS)).abs() < 1e-5);
        assert!((b.pos.z - BALL_Z).abs() < 1e-6);
    }

    #[test]
    fn test_transfer_preserves_world_position() {
        let d = desc();
        let mut frames = FrameCache::new();
        let mut b = BallState::spawn(&d);
        b.pos.x = -d.side_len() / 2.0; // at the left edge

        let before = b.world_pos(&mut frames, d.sides);
        b.transfer(&d, 1);
        let after = b.world_pos(&mut frames, d.sides);

        assert_eq!(b.side, 1);
        assert!((before - after).length() < 1e-4);
    }

    #[test]
    fn test_transfer_wraps_side_index() {
        let d = desc();
        let mut b = BallState::spawn(&d);
        b.transfer(&d, -1);
        assert_eq!(b.side, 5);
        b.transfer(&d, 1);
        assert_eq!(b.side, 0);
    }

    #[test]
    fn test_new_session_state() {
        let config = TunnelConfig::default();
        let state = GameState::new(&config, 11);
        assert_eq!(state.window.len(), config.window_size);
        assert_eq!(state.occupied_level, 0);
        assert_eq!(state.occupied_desc().id, 0);
    }
}
