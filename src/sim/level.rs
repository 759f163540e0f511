//! Level descriptors and panel cell state
//!
//! A level segment is a contiguous run of rows sharing one immutable
//! `LevelDescriptor`. The descriptor's `id` is the sole equality key used to
//! detect level-boundary crossings.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::consts::{BALL_RADIUS, BALL_Z, FALL_SUPPORT_SECS};

/// Invalid geometric configuration, rejected at descriptor construction time.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Fewer than 3 tunnel sides
    BadSides(u32),
    /// Zero panels per side
    BadPanelsPerSide(u32),
    /// A length/speed parameter that must be strictly positive was not
    NonPositive(&'static str, f32),
    /// Fall velocity below zero
    NegativeFallVelocity(f32),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::BadSides(n) => write!(f, "tunnel needs at least 3 sides, got {n}"),
            ConfigError::BadPanelsPerSide(n) => {
                write!(f, "need at least 1 panel per side, got {n}")
            }
            ConfigError::NonPositive(name, v) => {
                write!(f, "{name} must be positive, got {v}")
            }
            ConfigError::NegativeFallVelocity(v) => {
                write!(f, "fall velocity must be non-negative, got {v}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// One panel's state.
///
/// `Armed` panels collapse when touched. `Falling::elapsed` advances in place
/// each tick; a negative value is a stagger delay from cascade propagation
/// (the panel is triggered but has not started sinking yet).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Solid,
    Armed,
    Falling { elapsed: f32 },
}

impl Cell {
    /// Whether the panel can currently hold the ball up.
    pub fn supports(&self) -> bool {
        match self {
            Cell::Empty => false,
            Cell::Solid | Cell::Armed => true,
            Cell::Falling { elapsed } => *elapsed <= FALL_SUPPORT_SECS,
        }
    }

    /// Current drop distance below the tunnel surface.
    pub fn fall_drop(&self, fall_velocity: f32) -> f32 {
        match self {
            Cell::Falling { elapsed } => fall_velocity * elapsed.max(0.0),
            _ => 0.0,
        }
    }
}

/// One depth-slice of the tunnel: one cell per (side, panel-in-side) position,
/// ring-ordered so the tangential index wraps.
pub type PanelRow = Vec<Cell>;

/// Immutable geometric/gameplay parameters for one tunnel segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    /// Monotonically increasing identity; the sole equality key
    pub id: u64,
    pub sides: u32,
    pub panels_per_side: u32,
    pub panel_width: f32,
    /// Also the row pitch along the tunnel axis
    pub panel_depth: f32,
    pub speed: f32,
    pub fall_velocity: f32,
    pub color: [f32; 4],
}

impl LevelDescriptor {
    pub fn new(
        id: u64,
        sides: u32,
        panels_per_side: u32,
        panel_width: f32,
        panel_depth: f32,
        speed: f32,
        fall_velocity: f32,
        color: [f32; 4],
    ) -> Result<Self, ConfigError> {
        if sides < 3 {
            return Err(ConfigError::BadSides(sides));
        }
        if panels_per_side < 1 {
            return Err(ConfigError::BadPanelsPerSide(panels_per_side));
        }
        if panel_width <= 0.0 {
            return Err(ConfigError::NonPositive("panel_width", panel_width));
        }
        if panel_depth <= 0.0 {
            return Err(ConfigError::NonPositive("panel_depth", panel_depth));
        }
        if speed <= 0.0 {
            return Err(ConfigError::NonPositive("speed", speed));
        }
        if fall_velocity < 0.0 {
            return Err(ConfigError::NegativeFallVelocity(fall_velocity));
        }
        Ok(Self {
            id,
            sides,
            panels_per_side,
            panel_width,
            panel_depth,
            speed,
            fall_velocity,
            color,
        })
    }

    /// Interior angle step between adjacent faces.
    #[inline]
    pub fn rotation_angle(&self) -> f32 {
        2.0 * PI / self.sides as f32
    }

    /// Length of one face.
    #[inline]
    pub fn side_len(&self) -> f32 {
        self.panels_per_side as f32 * self.panel_width
    }

    /// Distance from the tunnel axis to each face.
    #[inline]
    pub fn apothem(&self) -> f32 {
        self.side_len() / (2.0 * (PI / self.sides as f32).tan())
    }

    /// Distance between opposite faces.
    #[inline]
    pub fn tunnel_height(&self) -> f32 {
        2.0 * self.apothem()
    }

    /// Tangential center of the first panel on a face (face-local x).
    #[inline]
    pub fn pane_start_x(&self) -> f32 {
        -self.side_len() / 2.0 + self.panel_width / 2.0
    }

    /// Face surface height (face-local y).
    #[inline]
    pub fn pane_start_y(&self) -> f32 {
        -self.apothem()
    }

    /// Tangential center of panel `j` on a face.
    #[inline]
    pub fn panel_x(&self, panel: u32) -> f32 {
        self.pane_start_x() + panel as f32 * self.panel_width
    }

    /// Number of cells in one row.
    #[inline]
    pub fn ring_len(&self) -> usize {
        (self.sides * self.panels_per_side) as usize
    }

    /// Ball spawn position for this segment, in the down face's local frame.
    pub fn spawn_pos(&self) -> Vec3 {
        Vec3::new(0.0, self.pane_start_y() + BALL_RADIUS, BALL_Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(sides: u32, panels: u32, width: f32) -> LevelDescriptor {
        LevelDescriptor::new(0, sides, panels, width, 10.0, 5.0, 0.5, [1.0; 4]).unwrap()
    }

    #[test]
    fn test_rejects_bad_geometry() {
        assert_eq!(
            LevelDescriptor::new(0, 2, 2, 2.0, 10.0, 5.0, 0.5, [1.0; 4]),
            Err(ConfigError::BadSides(2))
        );
        assert_eq!(
            LevelDescriptor::new(0, 6, 0, 2.0, 10.0, 5.0, 0.5, [1.0; 4]),
            Err(ConfigError::BadPanelsPerSide(0))
        );
        assert!(matches!(
            LevelDescriptor::new(0, 6, 2, -1.0, 10.0, 5.0, 0.5, [1.0; 4]),
            Err(ConfigError::NonPositive("panel_width", _))
        ));
        assert!(matches!(
            LevelDescriptor::new(0, 6, 2, 2.0, 10.0, 5.0, -0.1, [1.0; 4]),
            Err(ConfigError::NegativeFallVelocity(_))
        ));
    }

    #[test]
    fn test_hexagon_geometry() {
        // 6 sides, 2 panels of width 2: side length 4, apothem 2*sqrt(3)
        let d = desc(6, 2, 2.0);
        assert!((d.side_len() - 4.0).abs() < 1e-5);
        assert!((d.apothem() - 2.0 * 3.0_f32.sqrt()).abs() < 1e-4);
        assert!((d.tunnel_height() - 2.0 * d.apothem()).abs() < 1e-5);
        assert!((d.pane_start_x() - (-1.0)).abs() < 1e-5);
        assert!((d.panel_x(1) - 1.0).abs() < 1e-5);
        assert_eq!(d.ring_len(), 12);
    }

    #[test]
    fn test_cell_support() {
        assert!(!Cell::Empty.supports());
        assert!(Cell::Solid.supports());
        assert!(Cell::Armed.supports());
        assert!(Cell::Falling { elapsed: -0.2 }.supports());
        assert!(Cell::Falling { elapsed: 0.1 }.supports());
        assert!(!Cell::Falling { elapsed: 10.0 }.supports());
    }

    #[test]
    fn test_fall_drop() {
        // Staggered panels have not started dropping yet
        assert_eq!(Cell::Falling { elapsed: -0.5 }.fall_drop(4.0), 0.0);
        assert!((Cell::Falling { elapsed: 0.5 }.fall_drop(4.0) - 2.0).abs() < 1e-6);
        assert_eq!(Cell::Solid.fall_drop(4.0), 0.0);
    }
}
