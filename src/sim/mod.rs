//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering or platform dependencies
//! - Single-threaded: every mutation happens inside the per-frame tick

pub mod collision;
pub mod frame;
pub mod generator;
pub mod level;
pub mod state;
pub mod tick;
pub mod window;

pub use collision::{is_colliding, scan_contacts, trigger_fall_cascade, PanelHit};
pub use frame::{side_step, FrameCache};
pub use generator::{LevelGenerator, Segment};
pub use level::{Cell, ConfigError, LevelDescriptor, PanelRow};
pub use state::{BallState, Contact, GameState, RunStats, Steer};
pub use tick::{tick, TickInput};
pub use window::RowWindow;
