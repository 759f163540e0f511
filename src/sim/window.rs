//! Sliding window over the visible panel rows
//!
//! The window owns the queue of not-yet-reclaimed level segments and a
//! fixed-size deque of row references into them, in depth order: front is the
//! nearest row (about to be consumed), back is the farthest. The deque length
//! is constant after the initial fill, across every operation.

use std::collections::VecDeque;

use super::generator::{LevelGenerator, Segment};
use super::level::{Cell, LevelDescriptor, PanelRow};
use crate::config::TunnelConfig;
use crate::consts::BALL_Z;

pub struct RowWindow {
    generator: LevelGenerator,
    /// Not-yet-reclaimed segments, oldest first
    levels: VecDeque<Segment>,
    /// (level offset from front, row index) per visible row
    visible: VecDeque<(usize, usize)>,
    /// Cursor of the next row to bring into view
    fill_offset: usize,
    fill_row: usize,
    window_size: usize,
    /// World z of the nearest visible row's center
    start_z: f32,
}

impl RowWindow {
    pub fn new(config: &TunnelConfig, seed: u64) -> Self {
        Self::from_segments(config, LevelGenerator::new(seed, config), Vec::new())
    }

    /// Build a window over pre-built segments (scripted levels); the
    /// generator takes over once they are exhausted.
    pub fn from_segments(
        config: &TunnelConfig,
        mut generator: LevelGenerator,
        segments: Vec<Segment>,
    ) -> Self {
        if let Some(max_id) = segments.iter().map(|s| s.desc.id).max() {
            generator.resume_from(max_id + 1);
        }
        let mut window = Self {
            generator,
            levels: segments.into(),
            visible: VecDeque::with_capacity(config.window_size),
            fill_offset: 0,
            fill_row: 0,
            window_size: config.window_size,
            start_z: 0.0,
        };
        while window.visible.len() < window.window_size {
            window.push_next_row();
        }
        window
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn start_z(&self) -> f32 {
        self.start_z
    }

    /// Read-only view in render order (front = nearest).
    pub fn rows_in_view(&self) -> impl Iterator<Item = &PanelRow> {
        self.visible.iter().map(|&(off, r)| &self.levels[off].rows[r])
    }

    pub fn row(&self, i: usize) -> &PanelRow {
        let (off, r) = self.visible[i];
        &self.levels[off].rows[r]
    }

    pub fn level_for_row(&self, i: usize) -> &LevelDescriptor {
        let (off, _) = self.visible[i];
        &self.levels[off].desc
    }

    /// Owning segment and row index within it, for in-place cell mutation.
    pub fn segment_row_mut(&mut self, i: usize) -> (&mut Segment, usize) {
        let (off, r) = self.visible[i];
        (&mut self.levels[off], r)
    }

    /// World z of every visible row center, front first. Row pitch comes from
    /// each row's own descriptor, so grids of differing depth tile seamlessly.
    pub fn row_centers(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.visible.len());
        let mut z = self.start_z;
        let mut prev_depth: Option<f32> = None;
        for i in 0..self.visible.len() {
            let depth = self.level_for_row(i).panel_depth;
            if let Some(pd) = prev_depth {
                z -= (pd + depth) / 2.0;
            }
            out.push(z);
            prev_depth = Some(depth);
        }
        out
    }

    /// Per-tick scroll bookkeeping when no row crossed the camera threshold.
    pub fn update_start_z(&mut self, new_start_z: f32) {
        self.start_z = new_start_z;
    }

    /// Consume one row that has fully scrolled behind the camera: advance the
    /// fill cursor (generating a new segment when the current one runs out),
    /// bring the next row into view, evict the oldest. Strict FIFO; the
    /// window size is preserved.
    pub fn advance_window(&mut self, new_start_z: f32) {
        let before = self.visible.len();
        self.push_next_row();
        self.visible.pop_front();
        self.start_z = new_start_z;
        assert_eq!(self.visible.len(), before, "row window must keep its size");
    }

    /// Reclaim fully-passed front segments. Called when the ball's occupied
    /// level id advances; a segment goes only once it both precedes the
    /// occupied id and has no rows left in view.
    pub fn commit_level_boundary_crossed(&mut self, occupied_id: u64) {
        while self.levels.len() > 1 {
            let front_in_view = self.visible.iter().any(|&(off, _)| off == 0);
            if self.levels[0].desc.id >= occupied_id || front_in_view || self.fill_offset == 0 {
                break;
            }
            let gone = self.levels.pop_front().expect("checked non-empty");
            for r in self.visible.iter_mut() {
                r.0 -= 1;
            }
            self.fill_offset -= 1;
            log::debug!("Reclaimed level {}", gone.desc.id);
        }
    }

    /// Full rebuild of the visible window from the start of the segment with
    /// the given id, used on fall-through failure. In-progress falling panels
    /// are clamped back to just-triggered so a reset level does not resume
    /// mid-collapse.
    pub fn reset_to_level(&mut self, id: u64) {
        while self.levels.len() > 1 && self.levels[0].desc.id < id {
            self.levels.pop_front();
        }
        assert!(
            self.levels.front().is_some_and(|s| s.desc.id == id),
            "reset target level {id} must still be loaded"
        );

        for seg in self.levels.iter_mut() {
            for row in seg.rows.iter_mut() {
                for cell in row.iter_mut() {
                    if let Cell::Falling { elapsed } = cell {
                        *elapsed = (*elapsed).min(0.0);
                    }
                }
            }
        }

        self.visible.clear();
        self.fill_offset = 0;
        self.fill_row = 0;
        while self.visible.len() < self.window_size {
            self.push_next_row();
        }
        self.start_z = BALL_Z + self.levels[0].desc.panel_depth;
        log::info!("Reset window to level {id}");
    }

    /// Advance every triggered falling panel in view.
    pub fn advance_falling(&mut self, dt: f32) {
        for &(off, r) in &self.visible {
            for cell in self.levels[off].rows[r].iter_mut() {
                if let Cell::Falling { elapsed } = cell {
                    *elapsed += dt;
                }
            }
        }
    }

    fn push_next_row(&mut self) {
        if self.fill_offset >= self.levels.len() {
            self.append_segment();
        }
        if self.fill_row >= self.levels[self.fill_offset].rows.len() {
            self.fill_offset += 1;
            self.fill_row = 0;
            if self.fill_offset >= self.levels.len() {
                self.append_segment();
            }
        }
        self.visible.push_back((self.fill_offset, self.fill_row));
        self.fill_row += 1;
    }

    fn append_segment(&mut self) {
        let seg = self.generator.generate();
        // Window underflow is a fatal precondition violation: the generator
        // must always be able to refill the view.
        assert!(!seg.rows.is_empty(), "generator produced an empty segment");
        self.levels.push_back(seg);
    }
}
