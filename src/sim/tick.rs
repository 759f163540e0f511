//! Per-tick session controller
//!
//! One logical tick per rendered frame: scroll the tunnel, consume rows that
//! crossed behind the camera, commit level-boundary crossings, resolve ball
//! contact and motion, publish the camera. All state mutation happens
//! synchronously in here.

use glam::{Mat4, Vec3};

use super::collision::{scan_contacts, trigger_fall_cascade, PanelHit};
use super::frame::side_step;
use super::level::Cell;
use super::state::{BallState, Contact, GameState, Steer};
use super::window::RowWindow;
use crate::blend_angle;
use crate::config::TunnelConfig;
use crate::consts::{BALL_RADIUS, BALL_SPIN_RATE, BALL_Z, BEHIND_Z};

/// Input commands for a single tick.
///
/// `move_left`/`move_right` are latched held-state; `jump` is edge-triggered
/// and cleared by the host once consumed. Input handlers never mutate ball
/// position directly.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
}

/// Advance the session by one timestep.
pub fn tick(state: &mut GameState, config: &TunnelConfig, input: &TickInput, dt: f32) {
    state.stats.time_ticks += 1;
    state.ball.spin += BALL_SPIN_RATE * dt;

    // Descriptor of the segment the ball occupied coming into this tick
    let old_desc = state.occupied_desc().clone();

    // Advance triggered panels in place
    state.window.advance_falling(dt);

    // Scroll by the occupied segment's speed; consume every row whose center
    // crossed the behind-camera threshold (zero, one, or more per tick).
    let scroll = old_desc.speed * dt;
    state.stats.distance += scroll;
    let mut start_z = state.window.start_z() + scroll;
    let mut crossings: u64 = 0;
    while start_z >= BEHIND_Z {
        let evicted_depth = state.window.level_for_row(0).panel_depth;
        let next_depth = state.window.level_for_row(1).panel_depth;
        start_z -= (evicted_depth + next_depth) / 2.0;
        state.window.advance_window(start_z);
        crossings += 1;
    }
    if crossings == 0 {
        state.window.update_start_z(start_z);
    }
    state.stats.rows_crossed += crossings;

    // Level-boundary crossing: re-anchor the ball into the new segment's
    // geometry and let the window reclaim fully-passed segments.
    let centers = state.window.row_centers();
    if let Some(i) = occupied_row(&state.window, &centers) {
        let new_desc = state.window.level_for_row(i).clone();
        if new_desc.id != state.occupied_level {
            enter_level(state, &old_desc, &new_desc);
        }
    }
    let desc = state.occupied_desc().clone();

    // Latched steering
    let half_len = desc.side_len() / 2.0;
    if input.move_left {
        state.ball.pos.x -= config.move_speed * dt;
        state.ball.steer = Steer::Left;
    } else if input.move_right {
        state.ball.pos.x += config.move_speed * dt;
        state.ball.steer = Steer::Right;
    }

    // Crossing a face edge rotates which side is down
    if state.ball.pos.x < -half_len {
        rotate_ball(state, &desc, 1);
    } else if state.ball.pos.x > half_len {
        rotate_ball(state, &desc, -1);
    }

    // Contact scan over the visible rows
    let ball_world = state.ball.world_pos(&mut state.frames, desc.sides);
    let hits = scan_contacts(&state.window, &mut state.frames, ball_world, &centers);

    let rising = state.ball.vel_y > 1e-3;
    let mut support = if rising {
        None
    } else {
        pick_support(&hits, state.ball.side)
    };

    // Rotation-side selection on multi-contact: prefer the side continuing
    // the last horizontal input direction; without a directional tie-break,
    // no rotation is queued this frame.
    if support.is_none() && !rising && !hits.is_empty() {
        let step = state.ball.steer.rotation_step();
        if step != 0 {
            let preferred = side_step(desc.sides, state.ball.side, step);
            if let Some(hit) = pick_support(&hits, preferred) {
                rotate_ball(state, &desc, step);
                support = Some(hit);
            }
        }
    }

    match support {
        Some(hit) => {
            // Snap onto the surface and rest
            state.ball.pos.y -= hit.dist;
            state.ball.is_jumping = false;
            let fall_velocity = state.window.level_for_row(hit.vis_row).fall_velocity;
            match hit.cell {
                Cell::Armed => {
                    let (segment, row_idx) = state.window.segment_row_mut(hit.vis_row);
                    trigger_fall_cascade(segment, row_idx, hit.ring);
                    state.ball.contact = Contact::Falling;
                    state.ball.vel_y = -fall_velocity;
                    state.ball.accel_y = 0.0;
                }
                Cell::Falling { .. } => {
                    state.ball.contact = Contact::Falling;
                    state.ball.vel_y = -fall_velocity;
                    state.ball.accel_y = 0.0;
                }
                _ => {
                    state.ball.contact = Contact::Solid;
                    state.ball.vel_y = 0.0;
                    state.ball.accel_y = 0.0;
                }
            }
        }
        None => {
            // Airborne: integrate gravity along the face normal
            state.ball.contact = Contact::Airborne;
            state.ball.accel_y = -config.gravity;
            state.ball.vel_y += state.ball.accel_y * dt;
            state.ball.pos.y += state.ball.vel_y * dt;
        }
    }

    // Jump is a pure velocity set, integrated by the gravity step above
    if input.jump && state.ball.contact.is_grounded() && !state.ball.is_jumping {
        state.ball.vel_y = config.jump_speed;
        state.ball.accel_y = -config.gravity;
        state.ball.is_jumping = true;
        state.ball.contact = Contact::Airborne;
    }

    // Fell all the way through: reset ball and window to the start of the
    // occupied segment
    if state.ball.pos.y - BALL_RADIUS < desc.pane_start_y() - config.fall_through_depth {
        reset_to_level(state);
    }

    publish_camera(state, config);
}

/// Index of the visible row whose depth span contains the ball.
fn occupied_row(window: &RowWindow, centers: &[f32]) -> Option<usize> {
    centers
        .iter()
        .enumerate()
        .find(|&(i, z)| (z - BALL_Z).abs() <= window.level_for_row(i).panel_depth / 2.0)
        .map(|(i, _)| i)
}

/// Best supporting contact on the given side, if any.
fn pick_support(hits: &[PanelHit], side: u32) -> Option<PanelHit> {
    hits.iter()
        .filter(|h| h.side == side)
        .min_by(|a, b| a.dist.abs().total_cmp(&b.dist.abs()))
        .copied()
}

fn rotate_ball(state: &mut GameState, desc: &super::level::LevelDescriptor, direction: i32) {
    state.ball.transfer(desc, direction);
    // Rotating mid-jump ends the jump; the gravity step takes over
    state.ball.is_jumping = false;
}

/// Re-anchor the ball when its occupied segment changes: keep the height
/// above the surface, clamp the tangential position into the new face, remap
/// the side index into the new arity, drop stale rotation frames.
fn enter_level(
    state: &mut GameState,
    old_desc: &super::level::LevelDescriptor,
    new_desc: &super::level::LevelDescriptor,
) {
    let height = state.ball.pos.y - old_desc.pane_start_y();
    state.ball.pos.y = new_desc.pane_start_y() + height;
    let half = new_desc.side_len() / 2.0;
    state.ball.pos.x = state.ball.pos.x.clamp(-half, half);
    if state.ball.side >= new_desc.sides {
        state.ball.side %= new_desc.sides;
    }
    state.frames.clear();

    state.occupied_level = new_desc.id;
    state.stats.levels_entered += 1;
    state.window.commit_level_boundary_crossed(new_desc.id);
    log::info!(
        "Entered level {} ({}-gon, speed {:.1})",
        new_desc.id,
        new_desc.sides,
        new_desc.speed
    );
}

fn reset_to_level(state: &mut GameState) {
    let id = state.occupied_level;
    state.window.reset_to_level(id);
    let desc = state.window.level_for_row(0).clone();
    state.ball = BallState::spawn(&desc);
    state.frames.clear();
    state.camera_roll = 0.0;
    state.stats.resets += 1;
    log::info!("Fell through, reset to level {id}");
}

/// Publish the smoothed camera transform: roll toward the frame of the
/// current rotation side, slight lateral follow of the ball.
fn publish_camera(state: &mut GameState, config: &TunnelConfig) {
    let desc = state.occupied_desc();
    let target = state.ball.side as f32 * desc.rotation_angle();
    let sides = desc.sides;
    state.camera_roll = blend_angle(state.camera_roll, target, config.camera_blend);
    let ball_world = state.ball.world_pos(&mut state.frames, sides);
    state.camera = Mat4::from_translation(Vec3::new(
        -ball_world.x * 0.2,
        -config.camera_lift,
        0.0,
    )) * Mat4::from_rotation_z(state.camera_roll);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::generator::{LevelGenerator, Segment};
    use crate::sim::level::LevelDescriptor;

    fn scripted_state(rows: Vec<Vec<Cell>>, window_size: usize) -> GameState {
        let config = TunnelConfig {
            window_size,
            ..Default::default()
        };
        let desc =
            LevelDescriptor::new(0, 6, 2, 2.0, 10.0, 5.0, 1.0, [1.0; 4]).unwrap();
        let seg = Segment { desc, rows };
        let window =
            RowWindow::from_segments(&config, LevelGenerator::new(1, &config), vec![seg]);
        GameState::from_window(window, 1)
    }

    fn solid_rows(n: usize) -> Vec<Vec<Cell>> {
        vec![vec![Cell::Solid; 12]; n]
    }

    #[test]
    fn test_resting_ball_stays_resting() {
        let config = TunnelConfig::default();
        let mut state = scripted_state(solid_rows(40), 12);
        for _ in 0..50 {
            tick(&mut state, &config, &TickInput::default(), SIM_DT);
            assert_eq!(state.ball.contact, Contact::Solid);
            assert!(!state.ball.is_jumping);
        }
        assert_eq!(state.stats.resets, 0);
    }

    #[test]
    fn test_scenario_b_jump_sets_airborne() {
        let config = TunnelConfig::default();
        let mut state = scripted_state(solid_rows(40), 12);
        assert_eq!(state.ball.contact, Contact::Solid);

        let input = TickInput {
            jump: true,
            ..Default::default()
        };
        tick(&mut state, &config, &input, SIM_DT);
        assert!(state.ball.is_jumping);
        assert_eq!(state.ball.contact, Contact::Airborne);

        // Jump is not re-triggered while airborne
        tick(&mut state, &config, &input, SIM_DT);
        assert!(state.ball.vel_y > 0.0);
        assert_eq!(state.ball.contact, Contact::Airborne);
    }

    #[test]
    fn test_jump_lands_back_on_solid() {
        let config = TunnelConfig::default();
        let mut state = scripted_state(solid_rows(60), 12);
        let input = TickInput {
            jump: true,
            ..Default::default()
        };
        tick(&mut state, &config, &input, SIM_DT);
        assert!(state.ball.is_jumping);

        let mut landed = false;
        for _ in 0..600 {
            tick(&mut state, &config, &TickInput::default(), SIM_DT);
            if state.ball.contact == Contact::Solid {
                landed = true;
                break;
            }
        }
        assert!(landed, "ball should land within a few seconds");
        assert!(!state.ball.is_jumping);
        assert_eq!(state.stats.resets, 0);
    }

    #[test]
    fn test_scenario_c_fall_through_resets_to_spawn() {
        let config = TunnelConfig::default();
        let mut state = scripted_state(solid_rows(40), 12);
        let desc = state.occupied_desc().clone();

        // Drift past the fall-through threshold
        state.ball.pos.y = desc.pane_start_y() - config.fall_through_depth - 1.0;
        state.ball.contact = Contact::Airborne;
        tick(&mut state, &config, &TickInput::default(), SIM_DT);

        assert_eq!(state.stats.resets, 1);
        let spawn = state.window.level_for_row(0).spawn_pos();
        assert!((state.ball.pos - spawn).length() < 1e-5);
        assert_eq!(state.ball.side, 0);
        assert_eq!(state.ball.contact, Contact::Solid);
    }

    #[test]
    fn test_holding_left_rotates_side() {
        let config = TunnelConfig::default();
        let mut state = scripted_state(solid_rows(60), 12);
        let input = TickInput {
            move_left: true,
            ..Default::default()
        };
        let mut rotated = false;
        for _ in 0..120 {
            tick(&mut state, &config, &input, SIM_DT);
            if state.ball.side == 1 {
                rotated = true;
                break;
            }
        }
        assert!(rotated, "holding left should carry the ball onto the next face");
        assert_eq!(state.ball.steer, Steer::Left);
        assert_eq!(state.stats.resets, 0);
    }

    #[test]
    fn test_armed_panel_triggers_cascade_under_ball() {
        let config = TunnelConfig::default();
        // The ball sits over the second row (depth -6); arm the whole ring
        // there and behind it.
        let mut rows = solid_rows(40);
        for row in rows.iter_mut().take(6).skip(1) {
            for cell in row.iter_mut() {
                *cell = Cell::Armed;
            }
        }
        let mut state = scripted_state(rows, 12);

        tick(&mut state, &config, &TickInput::default(), SIM_DT);
        assert_eq!(state.ball.contact, Contact::Falling);
        assert!(state.ball.vel_y < 0.0);

        // The contacted panel and its chain are falling now
        let falling = state
            .window
            .rows_in_view()
            .flat_map(|r| r.iter())
            .filter(|c| matches!(c, Cell::Falling { .. }))
            .count();
        assert!(falling > 1, "cascade should spread beyond the trigger");
    }

    #[test]
    fn test_rows_cross_behind_camera() {
        let config = TunnelConfig::default();
        let mut state = scripted_state(solid_rows(200), 12);
        // Level 0 speed is 5.0; scrolling for ~3 seconds crosses past z=10
        // and consumes at least one row.
        for _ in 0..360 {
            tick(&mut state, &config, &TickInput::default(), SIM_DT);
        }
        assert!(state.stats.rows_crossed >= 1);
        assert_eq!(state.window.len(), 12);
        assert!(state.stats.distance > 10.0);
    }

    #[test]
    fn test_determinism_with_same_seed() {
        let config = TunnelConfig::default();
        let mut a = GameState::new(&config, 777);
        let mut b = GameState::new(&config, 777);
        let script = |t: u64| TickInput {
            move_left: t % 60 < 20,
            move_right: (120..140).contains(&(t % 240)),
            jump: t % 90 == 0,
        };
        for t in 0..1200 {
            let input = script(t);
            tick(&mut a, &config, &input, SIM_DT);
            tick(&mut b, &config, &input, SIM_DT);
        }
        assert_eq!(a.stats.time_ticks, b.stats.time_ticks);
        assert_eq!(a.stats.rows_crossed, b.stats.rows_crossed);
        assert_eq!(a.stats.resets, b.stats.resets);
        assert_eq!(a.ball.side, b.ball.side);
        assert!((a.ball.pos - b.ball.pos).length() < 1e-6);
    }
}
