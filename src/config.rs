//! Gameplay tuning and host configuration
//!
//! Everything a host may want to adjust without recompiling. Defaults match
//! the shipped gameplay feel; a JSON file can override them.

use serde::{Deserialize, Serialize};

/// Tunable gameplay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelConfig {
    /// Number of rows kept in view
    pub window_size: usize,

    // === Ball motion ===
    /// Downward acceleration along the current face normal (units/s²)
    pub gravity: f32,
    /// Initial upward velocity of a jump (units/s)
    pub jump_speed: f32,
    /// Lateral steer speed while a direction is held (units/s)
    pub move_speed: f32,
    /// Distance below a face surface at which the ball counts as fallen through
    pub fall_through_depth: f32,

    // === Difficulty scaling (per-segment, by segment id) ===
    /// Scroll speed of the first segment
    pub base_speed: f32,
    /// Scroll speed ceiling
    pub max_speed: f32,
    /// Fall velocity gained per segment id
    pub fall_vel_scale: f32,
    /// Fall velocity ceiling
    pub max_fall_velocity: f32,

    // === Camera ===
    /// Exponential blend factor per tick toward the target roll
    pub camera_blend: f32,
    /// How far the view center sits above the ball
    pub camera_lift: f32,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            window_size: 12,

            gravity: 65.0,
            jump_speed: 22.8,
            move_speed: 12.0,
            fall_through_depth: 8.0,

            base_speed: 5.0,
            max_speed: 30.0,
            fall_vel_scale: 0.35,
            max_fall_velocity: 6.0,

            camera_blend: 0.12,
            camera_lift: 1.5,
        }
    }
}

impl TunnelConfig {
    /// Load configuration from a JSON file, falling back to defaults on any
    /// missing or malformed input.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => {
                    log::info!("Loaded config from {path}");
                    config
                }
                Err(e) => {
                    log::warn!("Ignoring malformed config {path}: {e}");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No config at {path}, using defaults");
                Self::default()
            }
        }
    }

    /// Save configuration as pretty JSON.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).expect("config serializes");
        std::fs::write(path, json)
    }
}
