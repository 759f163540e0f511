//! Ball-panel collision detection and falling-panel propagation
//!
//! The tricky part of the tunnel: detecting contact between the ball and the
//! panels of an arbitrary-sided rotating cross-section. Each candidate panel
//! is tested in its own face frame: a tangential bound, a depth bound, and a
//! vertical distance-from-surface band must all pass.

use glam::Vec3;
use std::collections::VecDeque;

use super::frame::FrameCache;
use super::generator::Segment;
use super::level::{Cell, LevelDescriptor};
use super::window::RowWindow;
use crate::consts::{BALL_RADIUS, CATCH_MARGIN, CONTACT_EPSILON, FALL_STAGGER};

/// One detected ball-panel contact.
#[derive(Debug, Clone, Copy)]
pub struct PanelHit {
    /// Index of the row within the visible window
    pub vis_row: usize,
    pub side: u32,
    pub panel: u32,
    /// Tangential ring index (side * panels_per_side + panel)
    pub ring: usize,
    /// Signed distance from the ball's underside to the panel surface
    pub dist: f32,
    pub cell: Cell,
}

/// Signed surface distance if the ball is over the panel's footprint.
///
/// `None` when the tangential or depth bound fails. Positive distance means
/// the ball floats above the (possibly dropped) surface.
fn surface_distance(
    desc: &LevelDescriptor,
    frames: &mut FrameCache,
    ball_world: Vec3,
    side: u32,
    panel: u32,
    row_z: f32,
    fall_drop: f32,
) -> Option<f32> {
    let local = frames.world_to_local(desc.sides, side, ball_world);
    if (local.x - desc.panel_x(panel)).abs() > desc.panel_width / 2.0 {
        return None;
    }
    if (local.z - row_z).abs() > desc.panel_depth / 2.0 {
        return None;
    }
    let surface = desc.pane_start_y() - fall_drop;
    Some((local.y - BALL_RADIUS) - surface)
}

/// Strict per-panel intersection test: all three axis tests must pass, with
/// the vertical distance within the contact epsilon.
pub fn is_colliding(
    desc: &LevelDescriptor,
    frames: &mut FrameCache,
    ball_world: Vec3,
    side: u32,
    panel: u32,
    row_z: f32,
    fall_drop: f32,
) -> bool {
    surface_distance(desc, frames, ball_world, side, panel, row_z, fall_drop)
        .is_some_and(|d| d.abs() <= CONTACT_EPSILON)
}

/// Scan every supporting panel of every row overlapping the ball's depth.
///
/// Contacts are accepted within the resting epsilon above the surface and
/// within the catch margin below it (a descending ball is snapped up rather
/// than tunneling through between ticks).
pub fn scan_contacts(
    window: &RowWindow,
    frames: &mut FrameCache,
    ball_world: Vec3,
    centers: &[f32],
) -> Vec<PanelHit> {
    let mut hits = Vec::new();
    for (i, &z) in centers.iter().enumerate() {
        let desc = window.level_for_row(i);
        if (z - ball_world.z).abs() > desc.panel_depth / 2.0 {
            continue;
        }
        let row = window.row(i);
        for side in 0..desc.sides {
            for panel in 0..desc.panels_per_side {
                let ring = (side * desc.panels_per_side + panel) as usize;
                let cell = row[ring];
                if !cell.supports() {
                    continue;
                }
                let drop = cell.fall_drop(desc.fall_velocity);
                if let Some(dist) =
                    surface_distance(desc, frames, ball_world, side, panel, z, drop)
                {
                    if (-CATCH_MARGIN..=CONTACT_EPSILON).contains(&dist) {
                        hits.push(PanelHit {
                            vis_row: i,
                            side,
                            panel,
                            ring,
                            dist,
                            cell,
                        });
                    }
                }
            }
        }
    }
    hits
}

/// Flood the fall trigger out from an armed panel.
///
/// The panel directly behind (same tangential index, next row) inherits the
/// trigger's start offset; the two tangential ring neighbors start one
/// stagger step later per hop. Explicit worklist, no recursion; only `Armed`
/// cells convert, so every panel triggers at most once and the chain
/// terminates. Start delays are non-decreasing along every propagation path.
pub fn trigger_fall_cascade(segment: &mut Segment, row: usize, ring: usize) -> usize {
    let ring_len = segment.desc.ring_len();
    let mut converted = 0;
    let mut queue: VecDeque<(usize, usize, f32)> = VecDeque::new();
    queue.push_back((row, ring, 0.0));

    while let Some((r, c, delay)) = queue.pop_front() {
        let Some(cells) = segment.rows.get_mut(r) else {
            continue;
        };
        if cells[c] != Cell::Armed {
            continue;
        }
        cells[c] = Cell::Falling { elapsed: -delay };
        converted += 1;

        queue.push_back((r + 1, c, delay));
        queue.push_back((r, (c + 1) % ring_len, delay + FALL_STAGGER));
        queue.push_back((r, (c + ring_len - 1) % ring_len, delay + FALL_STAGGER));
    }

    if converted > 0 {
        log::debug!("Fall cascade from row {row} ring {ring}: {converted} panels");
    }
    converted
}
