//! Draw-call emission toward a host-owned renderer
//!
//! The core never draws. It describes the scene as `draw` calls against a
//! renderer the host supplies: panels for every visible row, the ball, and a
//! background starfield. Shape meshes, shaders, and textures are the host's
//! concern entirely.

use glam::{Mat3, Mat4, Vec3};
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::f32::consts::FRAC_PI_2;

use crate::consts::{BALL_RADIUS, FALL_DESPAWN_DROP};
use crate::sim::{GameState, LevelDescriptor};

/// Shapes the host renderer must know how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeId {
    Panel,
    Ball,
    Star,
}

/// Material parameters forwarded with each draw call.
#[derive(Debug, Clone, Copy)]
pub struct MaterialParams {
    pub ambient: f32,
    pub diffusivity: f32,
    pub specularity: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            ambient: 0.2,
            diffusivity: 0.7,
            specularity: 0.0,
        }
    }
}

/// The single operation the core needs from the rendering layer. Assumed
/// synchronous and non-failing.
pub trait Renderer {
    fn draw(&mut self, shape: ShapeId, transform: Mat4, color: [f32; 4], material: MaterialParams);
}

/// World transform of one panel: face rotation, then the panel's place in the
/// row grid (each row anchors at its own descriptor's pane start, so grids of
/// differing width tile seamlessly across level boundaries), then the flat
/// pane orientation and scale.
pub fn panel_transform(
    desc: &LevelDescriptor,
    side: u32,
    panel: u32,
    row_z: f32,
    fall_drop: f32,
) -> Mat4 {
    let local = Vec3::new(
        desc.panel_x(panel),
        desc.pane_start_y() - fall_drop,
        row_z,
    );
    Mat4::from_rotation_z(-(side as f32) * desc.rotation_angle())
        * Mat4::from_translation(local)
        * Mat4::from_rotation_x(-FRAC_PI_2)
        * Mat4::from_scale(Vec3::new(
            desc.panel_width / 2.0,
            desc.panel_depth / 2.0,
            1.0,
        ))
}

/// Ball transform: world position from the current face frame, roll spin,
/// radius scale.
pub fn ball_transform(state: &GameState) -> Mat4 {
    let desc = state.occupied_desc();
    let angle = state.ball.side as f32 * desc.rotation_angle();
    let world = Mat3::from_rotation_z(-angle) * state.ball.pos;
    Mat4::from_translation(world)
        * Mat4::from_rotation_x(-state.ball.spin)
        * Mat4::from_scale(Vec3::splat(BALL_RADIUS))
}

/// Background star transforms, seeded once per session.
pub struct Starfield {
    stars: Vec<(Vec3, f32)>,
}

impl Starfield {
    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut stars = Vec::with_capacity(1250);
        for i in 0..1000u32 {
            let flip = if rng.random::<bool>() { 1.0 } else { -1.0 };
            let x = (rng.random::<f32>() * 20.0 + 5.0) * flip;
            let y = rng.random::<f32>() * 30.0 - 15.0;
            let z = -5.0 * (i % 10) as f32;
            stars.push((Vec3::new(x, y, z), rng.random::<f32>() * 0.1));
        }
        // A thinner band above and below the tunnel mouth
        for i in 0..250u32 {
            let flip = if rng.random::<bool>() { 1.0 } else { -1.0 };
            let x = rng.random::<f32>() * 10.0 - 5.0;
            let y = (rng.random::<f32>() * 5.0 + 6.0) * flip;
            let z = -5.0 * (i % 10) as f32;
            stars.push((Vec3::new(x, y, z), rng.random::<f32>() * 0.1));
        }
        Self { stars }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}

/// Emit the whole scene in draw order: starfield, visible rows, ball.
pub fn draw_scene<R: Renderer>(state: &GameState, starfield: &Starfield, renderer: &mut R) {
    let star_material = MaterialParams {
        ambient: 1.0,
        ..Default::default()
    };
    for &(pos, scale) in &starfield.stars {
        renderer.draw(
            ShapeId::Star,
            Mat4::from_translation(pos) * Mat4::from_scale(Vec3::splat(scale)),
            [1.0, 1.0, 1.0, 1.0],
            star_material,
        );
    }

    let centers = state.window.row_centers();
    for (i, &z) in centers.iter().enumerate() {
        let desc = state.window.level_for_row(i);
        let row = state.window.row(i);
        for side in 0..desc.sides {
            for panel in 0..desc.panels_per_side {
                let ring = (side * desc.panels_per_side + panel) as usize;
                let cell = row[ring];
                if cell == crate::sim::Cell::Empty {
                    continue;
                }
                let drop = cell.fall_drop(desc.fall_velocity);
                if drop > FALL_DESPAWN_DROP {
                    continue;
                }
                renderer.draw(
                    ShapeId::Panel,
                    panel_transform(desc, side, panel, z, drop),
                    desc.color,
                    MaterialParams::default(),
                );
            }
        }
    }

    renderer.draw(
        ShapeId::Ball,
        ball_transform(state),
        [1.0, 1.0, 1.0, 1.0],
        MaterialParams::default(),
    );
}
