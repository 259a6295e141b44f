//! Spot pulse: single cells flicker through random glyphs while their color
//! breathes through the palette, then fade back to the original text.

use rand::Rng;
use tracing::debug;

use super::pool::UnitPool;
use super::{random_pause, EffectContext};
use crate::config::SpotPulseConfig;
use crate::core::grid::Grid;
use crate::core::position::select_position;
use crate::core::unit::{AnimatedUnit, UnitStyle};
use crate::ui::segments::Frame;

pub struct SpotPulse {
    config: SpotPulseConfig,
    pool: UnitPool,
}

impl SpotPulse {
    pub fn new(config: SpotPulseConfig, grid: Grid) -> Self {
        Self {
            config,
            pool: UnitPool::new(grid),
        }
    }

    pub fn live(&self) -> usize {
        self.pool.live()
    }

    pub fn max_units(&self) -> usize {
        self.config.max_active_chars
    }

    pub fn pool(&self) -> &UnitPool {
        &self.pool
    }

    fn style<'a, R: ?Sized>(&self, ctx: &EffectContext<'a, R>) -> UnitStyle<'a> {
        UnitStyle {
            palette: ctx.palette,
            char_set: ctx.char_set,
            fade_steps: self.config.fade_steps,
        }
    }

    /// Initial population
    pub fn start<R: Rng + ?Sized>(&mut self, ctx: &mut EffectContext<'_, R>) {
        for _ in 0..self.config.min_active_chars {
            if !self.try_spawn(ctx) {
                break;
            }
        }
    }

    /// Place one new unit. A failed attempt is simply dropped.
    pub fn try_spawn<R: Rng + ?Sized>(&mut self, ctx: &mut EffectContext<'_, R>) -> bool {
        if self.pool.live() >= self.config.max_active_chars {
            return false;
        }
        let occupied = self.pool.occupied();
        let separation = self.config.min_separation;
        let Some(pos) = select_position(self.pool.grid(), &occupied, separation, ctx.rng) else {
            debug!("No free cell for spot unit");
            return false;
        };
        let Some(original) = self.pool.grid().get(pos) else {
            return false;
        };

        let max_age = ctx
            .rng
            .gen_range(self.config.min_change_count..=self.config.max_change_count);
        let style = self.style(ctx);
        let unit = AnimatedUnit::active(pos, original, max_age, &style, ctx.rng);
        debug!("Spot unit at {:?} for {} ticks", pos, max_age);
        self.pool.push(unit);
        true
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, ctx: &mut EffectContext<'_, R>) -> Frame {
        let style = self.style(ctx);
        let (frame, _) = self.pool.tick(&style, ctx.rng);
        self.replenish(ctx);
        frame
    }

    /// Keep the population at the minimum, one paused spawn per missing unit
    fn replenish<R: Rng + ?Sized>(&mut self, ctx: &mut EffectContext<'_, R>) {
        if self.pool.grid().is_empty() {
            return;
        }
        let target = self.config.min_active_chars.min(self.config.max_active_chars);
        while self.pool.live() + ctx.scheduler.pending_spawns() < target {
            let (min_ms, max_ms) = (self.config.min_pause_duration, self.config.max_pause_duration);
            let pause = random_pause(ctx.rng, min_ms, max_ms);
            ctx.scheduler.schedule_spawn(pause);
        }
    }

    pub fn reset(&mut self) {
        self.pool.clear();
    }
}
