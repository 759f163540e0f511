//! Tunnel Roller entry point
//!
//! Headless demo driver: runs a scripted session at the fixed simulation
//! timestep and reports run statistics. A graphical host would supply real
//! input latching and a real renderer in place of the script and the
//! draw-call counter.
//!
//! Usage:
//!   tunnel-roller [--seed N] [--ticks N] [--config PATH] [--json]

use glam::Mat4;

use tunnel_roller::config::TunnelConfig;
use tunnel_roller::consts::SIM_DT;
use tunnel_roller::render::{draw_scene, MaterialParams, Renderer, ShapeId, Starfield};
use tunnel_roller::sim::{tick, GameState, TickInput};

/// Counts draw calls instead of drawing.
#[derive(Default)]
struct NullRenderer {
    draw_calls: u64,
}

impl Renderer for NullRenderer {
    fn draw(&mut self, _shape: ShapeId, _t: Mat4, _c: [f32; 4], _m: MaterialParams) {
        self.draw_calls += 1;
    }
}

struct Args {
    seed: u64,
    ticks: u64,
    config_path: Option<String>,
    json: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        seed: 12345,
        ticks: 120 * 60,
        config_path: None,
        json: false,
    };
    let argv: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--seed" if i + 1 < argv.len() => {
                args.seed = argv[i + 1].parse().unwrap_or(args.seed);
                i += 1;
            }
            "--ticks" if i + 1 < argv.len() => {
                args.ticks = argv[i + 1].parse().unwrap_or(args.ticks);
                i += 1;
            }
            "--config" if i + 1 < argv.len() => {
                args.config_path = Some(argv[i + 1].clone());
                i += 1;
            }
            "--json" => args.json = true,
            other => eprintln!("ignoring unknown argument {other}"),
        }
        i += 1;
    }
    args
}

/// Scripted input: weave across the tunnel, jump periodically.
fn scripted_input(t: u64) -> TickInput {
    let phase = (t / 300) % 4;
    TickInput {
        move_left: phase == 1,
        move_right: phase == 3,
        jump: t % 150 == 0 && t > 0,
    }
}

fn main() {
    env_logger::init();
    let args = parse_args();

    let config = match &args.config_path {
        Some(path) => TunnelConfig::load(path),
        None => TunnelConfig::default(),
    };

    let mut state = GameState::new(&config, args.seed);
    let starfield = Starfield::new(args.seed);
    let mut renderer = NullRenderer::default();

    let mut input = TickInput::default();
    for t in 0..args.ticks {
        let scripted = scripted_input(t);
        input.move_left = scripted.move_left;
        input.move_right = scripted.move_right;
        input.jump |= scripted.jump;

        tick(&mut state, &config, &input, SIM_DT);
        // Clear one-shot inputs after processing
        input.jump = false;

        // A frame per two sim ticks, roughly 60 fps worth of draw calls
        if t % 2 == 0 {
            draw_scene(&state, &starfield, &mut renderer);
        }
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&state.stats).expect("stats serialize")
        );
        return;
    }

    let secs = state.stats.time_ticks as f32 * SIM_DT;
    println!("Tunnel Roller demo run");
    println!("  Seed:          {}", args.seed);
    println!("  Sim time:      {secs:.1}s ({} ticks)", state.stats.time_ticks);
    println!("  Distance:      {:.1}", state.stats.distance);
    println!("  Rows crossed:  {}", state.stats.rows_crossed);
    println!("  Levels:        {}", state.stats.levels_entered + 1);
    println!("  Falls:         {}", state.stats.resets);
    println!("  Draw calls:    {}", renderer.draw_calls);
}
