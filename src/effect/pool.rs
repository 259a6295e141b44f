//! Unit collection shared by the grid-based variants.

use rand::Rng;
use tracing::trace;

use crate::core::grid::{CellPos, Grid, Overlay};
use crate::core::unit::{AnimatedUnit, UnitStyle};
use crate::ui::segments::{render_grid, Frame};

/// Immutable base grid plus the units animating over it
pub struct UnitPool {
    grid: Grid,
    units: Vec<AnimatedUnit>,
}

impl UnitPool {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            units: Vec::new(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn units(&self) -> &[AnimatedUnit] {
        &self.units
    }

    /// Units still animating, in any phase but removed
    pub fn live(&self) -> usize {
        self.units.iter().filter(|u| !u.is_removed()).count()
    }

    /// Anchor cells of live units
    pub fn occupied(&self) -> Vec<CellPos> {
        self.units.iter().filter(|u| !u.is_removed()).map(|u| u.pos()).collect()
    }

    pub fn push(&mut self, unit: AnimatedUnit) {
        self.units.push(unit);
    }

    pub fn clear(&mut self) {
        self.units.clear();
    }

    /// Advance every unit one step, render, then drop finished units.
    /// Returns the frame and how many units finished.
    pub fn tick<R: Rng + ?Sized>(&mut self, style: &UnitStyle<'_>, rng: &mut R) -> (Frame, usize) {
        let mut overlay = Overlay::new();
        for unit in &mut self.units {
            unit.tick(&self.grid, style, rng, &mut overlay);
        }
        let frame = render_grid(&self.grid, &overlay);

        let before = self.units.len();
        self.units.retain(|u| !u.is_removed());
        let removed = before - self.units.len();
        if removed > 0 {
            trace!("{} unit(s) finished, {} live", removed, self.units.len());
        }
        (frame, removed)
    }
}
