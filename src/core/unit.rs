//! Animated unit lifecycle.
//!
//! Every grid-based effect animates through the same state machine:
//!
//! ```text
//! Growing ──┐
//!           ├──> Fading ──> Removed
//! Active  ──┘
//! ```
//!
//! `Active` units (spot pulse) substitute a fresh glyph every tick while a
//! pulse oscillates through the palette. `Growing` units (radial spread)
//! scramble an expanding diamond of cells around their anchor. Both end in a
//! fade that walks the color toward white and reveals the original glyph
//! halfway through. Phases only ever move forward.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::trace;

use super::color::{distance_color, fade_toward_white, pulse_color};
use super::grid::{CellPos, Grid, Overlay, OverlayCell};

/// Glyph used when the configured charset is empty
const FALLBACK_GLYPH: char = '*';

/// Unit phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Growing,
    Active,
    Fading,
    Removed,
}

/// Shared look of all units of one effect
#[derive(Debug, Clone, Copy)]
pub struct UnitStyle<'a> {
    pub palette: &'a [String],
    pub char_set: &'a [char],
    pub fade_steps: u32,
}

/// Draw a substitution glyph
pub fn random_glyph<R: Rng + ?Sized>(char_set: &[char], rng: &mut R) -> char {
    if char_set.is_empty() {
        return FALLBACK_GLYPH;
    }
    char_set[rng.gen_range(0..char_set.len())]
}

/// Back-and-forth oscillation of a position in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    pub position: f64,
    pub direction: f64,
    pub speed: f64,
}

impl Pulse {
    pub fn new(speed: f64) -> Self {
        Self {
            position: 0.0,
            direction: 1.0,
            speed,
        }
    }

    pub fn advance(&mut self) {
        self.position += self.direction * self.speed;
        if self.position >= 1.0 {
            self.position = 1.0;
            self.direction = -1.0;
        } else if self.position <= 0.0 {
            self.position = 0.0;
            self.direction = 1.0;
        }
    }
}

/// A cell touched by a spreading unit
#[derive(Debug, Clone, PartialEq, Eq)]
struct SpreadCell {
    glyph: char,
    original: char,
    color: Option<String>,
}

/// Expanding neighbourhood of a radial unit
#[derive(Debug, Clone)]
struct Spread {
    step: usize,
    radius: usize,
    cells: BTreeMap<CellPos, SpreadCell>,
}

/// One animated unit anchored at a grid cell
#[derive(Debug, Clone)]
pub struct AnimatedUnit {
    pos: CellPos,
    phase: Phase,
    age: u32,
    max_age: u32,
    pulse: Pulse,
    current_glyph: char,
    original_glyph: char,
    fade_step: u32,
    fade_total_steps: u32,
    spread: Option<Spread>,
}

impl AnimatedUnit {
    /// A pulsing unit living for `max_age` ticks
    pub fn active<R: Rng + ?Sized>(
        pos: CellPos,
        original_glyph: char,
        max_age: u32,
        style: &UnitStyle<'_>,
        rng: &mut R,
    ) -> Self {
        let max_age = max_age.max(1);
        Self {
            pos,
            phase: Phase::Active,
            age: 0,
            max_age,
            pulse: Pulse::new(1.0 / max_age as f64),
            current_glyph: random_glyph(style.char_set, rng),
            original_glyph,
            fade_step: 0,
            fade_total_steps: style.fade_steps.max(1),
            spread: None,
        }
    }

    /// A spreading unit growing out to `radius`
    pub fn growing(
        pos: CellPos,
        original_glyph: char,
        radius: usize,
        style: &UnitStyle<'_>,
    ) -> Self {
        Self {
            pos,
            phase: Phase::Growing,
            age: 0,
            max_age: radius as u32 + 1,
            pulse: Pulse::new(0.0),
            current_glyph: original_glyph,
            original_glyph,
            fade_step: 0,
            fade_total_steps: style.fade_steps.max(1),
            spread: Some(Spread {
                step: 0,
                radius,
                cells: BTreeMap::new(),
            }),
        }
    }

    pub fn pos(&self) -> CellPos {
        self.pos
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn is_fading(&self) -> bool {
        self.phase == Phase::Fading
    }

    pub fn is_removed(&self) -> bool {
        self.phase == Phase::Removed
    }

    /// Current spread radius, for radial units
    pub fn spread_step(&self) -> Option<usize> {
        self.spread.as_ref().map(|s| s.step)
    }

    /// Advance one tick, painting the result into `overlay`
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        grid: &Grid,
        style: &UnitStyle<'_>,
        rng: &mut R,
        overlay: &mut Overlay,
    ) {
        match self.phase {
            Phase::Active => self.tick_active(style, rng, overlay),
            Phase::Growing => self.tick_growing(grid, style, rng, overlay),
            Phase::Fading => self.tick_fading(style, overlay),
            Phase::Removed => {}
        }
    }

    fn tick_active<R: Rng + ?Sized>(
        &mut self,
        style: &UnitStyle<'_>,
        rng: &mut R,
        overlay: &mut Overlay,
    ) {
        self.pulse.advance();
        self.age += 1;
        self.current_glyph = random_glyph(style.char_set, rng);
        let color = pulse_color(self.pulse.position, style.palette).map(str::to_string);
        overlay.insert(self.pos, OverlayCell::new(self.current_glyph, color));

        if self.age >= self.max_age {
            self.begin_fade();
        }
    }

    fn tick_growing<R: Rng + ?Sized>(
        &mut self,
        grid: &Grid,
        style: &UnitStyle<'_>,
        rng: &mut R,
        overlay: &mut Overlay,
    ) {
        let Some(spread) = self.spread.as_mut() else {
            self.begin_fade();
            return;
        };
        self.age += 1;

        let step = spread.step;
        let row_lo = self.pos.row.saturating_sub(step);
        let col_lo = self.pos.col.saturating_sub(step);
        for row in row_lo..=self.pos.row + step {
            for col in col_lo..=self.pos.col + step {
                let cell = CellPos::new(row, col);
                let distance = cell.manhattan(&self.pos);
                if distance > step {
                    continue;
                }
                let Some(original) = grid.get(cell) else {
                    continue;
                };
                let chance = 1.0 - distance as f64 / (step + 1) as f64;
                if !rng.gen_bool(chance.clamp(0.0, 1.0)) {
                    continue;
                }
                let color = distance_color(distance, spread.radius, style.palette).map(str::to_string);
                spread.cells.insert(
                    cell,
                    SpreadCell {
                        glyph: random_glyph(style.char_set, rng),
                        original,
                        color,
                    },
                );
            }
        }

        for (cell, state) in &spread.cells {
            overlay.insert(*cell, OverlayCell::new(state.glyph, state.color.clone()));
        }

        if spread.step >= spread.radius {
            self.begin_fade();
        } else {
            spread.step += 1;
        }
    }

    fn tick_fading(&mut self, style: &UnitStyle<'_>, overlay: &mut Overlay) {
        let progress = self.fade_step as f64 / self.fade_total_steps as f64;
        let revealed = progress >= 0.5;

        match &self.spread {
            Some(spread) => {
                for (cell, state) in &spread.cells {
                    let glyph = if revealed { state.original } else { state.glyph };
                    let color = state
                        .color
                        .as_deref()
                        .and_then(|c| faded(c, self.fade_step, self.fade_total_steps));
                    overlay.insert(*cell, OverlayCell::new(glyph, color));
                }
            }
            None => {
                let glyph = if revealed { self.original_glyph } else { self.current_glyph };
                let color = pulse_color(self.pulse.position, style.palette)
                    .and_then(|c| faded(c, self.fade_step, self.fade_total_steps));
                overlay.insert(self.pos, OverlayCell::new(glyph, color));
            }
        }

        self.fade_step += 1;
        if self.fade_step >= self.fade_total_steps {
            self.phase = Phase::Removed;
        }
    }

    fn begin_fade(&mut self) {
        self.phase = Phase::Fading;
        self.fade_step = 0;
    }
}

/// Fade a color, dropping the override for malformed input
fn faded(color: &str, step: u32, total: u32) -> Option<String> {
    match fade_toward_white(color, step, total) {
        Ok(c) => Some(c),
        Err(e) => {
            trace!("Skipping color override: {}", e);
            None
        }
    }
}
