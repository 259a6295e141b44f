//! Radial spread: scrambled diamonds grow out of random points, brightest at
//! the center, then fade out together and hand over to a new point.

use rand::Rng;
use tracing::debug;

use super::pool::UnitPool;
use super::{random_pause, EffectContext};
use crate::config::RadialSpreadConfig;
use crate::core::grid::Grid;
use crate::core::position::select_position;
use crate::core::unit::{AnimatedUnit, UnitStyle};
use crate::ui::segments::Frame;

pub struct RadialSpread {
    config: RadialSpreadConfig,
    pool: UnitPool,
}

impl RadialSpread {
    pub fn new(config: RadialSpreadConfig, grid: Grid) -> Self {
        Self {
            config,
            pool: UnitPool::new(grid),
        }
    }

    pub fn live(&self) -> usize {
        self.pool.live()
    }

    pub fn max_units(&self) -> usize {
        self.config.max_active_points
    }

    pub fn pool(&self) -> &UnitPool {
        &self.pool
    }

    /// Preferred distance between two spread centers: 1.5 × radius
    pub fn min_separation(&self) -> usize {
        (self.config.spread_radius * 3 + 1) / 2
    }

    fn style<'a, R: ?Sized>(&self, ctx: &EffectContext<'a, R>) -> UnitStyle<'a> {
        UnitStyle {
            palette: ctx.palette,
            char_set: ctx.char_set,
            fade_steps: self.config.fade_steps,
        }
    }

    /// One point right away, the rest after their pauses
    pub fn start<R: Rng + ?Sized>(&mut self, ctx: &mut EffectContext<'_, R>) {
        self.try_spawn(ctx);
        self.replenish(ctx);
    }

    pub fn try_spawn<R: Rng + ?Sized>(&mut self, ctx: &mut EffectContext<'_, R>) -> bool {
        if self.pool.live() >= self.config.max_active_points {
            return false;
        }
        let occupied = self.pool.occupied();
        let separation = self.min_separation();
        let Some(pos) = select_position(self.pool.grid(), &occupied, separation, ctx.rng) else {
            debug!("No free cell for spread point");
            return false;
        };
        let Some(original) = self.pool.grid().get(pos) else {
            return false;
        };

        let style = self.style(ctx);
        debug!("Spread point at {:?}, radius {}", pos, self.config.spread_radius);
        self.pool
            .push(AnimatedUnit::growing(pos, original, self.config.spread_radius, &style));
        true
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, ctx: &mut EffectContext<'_, R>) -> Frame {
        let style = self.style(ctx);
        let (frame, _) = self.pool.tick(&style, ctx.rng);
        self.replenish(ctx);
        frame
    }

    /// Schedule a replacement for every missing point
    fn replenish<R: Rng + ?Sized>(&mut self, ctx: &mut EffectContext<'_, R>) {
        if self.pool.grid().is_empty() {
            return;
        }
        while self.pool.live() + ctx.scheduler.pending_spawns() < self.config.max_active_points {
            let (min_ms, max_ms) = (self.config.min_pause_duration, self.config.max_pause_duration);
            let pause = random_pause(ctx.rng, min_ms, max_ms);
            ctx.scheduler.schedule_spawn(pause);
        }
    }

    pub fn reset(&mut self) {
        self.pool.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::{CellPos, GridFormatter};
    use crate::core::unit::Phase;
    use crate::effect::Scheduler;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn radial(radius: usize, points: usize) -> RadialSpread {
        let grid = GridFormatter::default().format(&"R".repeat(20 * 20), 160);
        RadialSpread::new(
            RadialSpreadConfig {
                spread_radius: radius,
                max_active_points: points,
                fade_steps: 2,
                ..Default::default()
            },
            grid,
        )
    }

    #[test]
    fn test_separation_is_one_and_a_half_radius() {
        assert_eq!(radial(2, 1).min_separation(), 3);
        assert_eq!(radial(3, 1).min_separation(), 5);
        assert_eq!(radial(0, 1).min_separation(), 0);
    }

    #[test]
    fn test_point_grows_fades_and_is_replaced() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut scheduler = Scheduler::new(Duration::from_millis(40));
        let palette = vec!["#203040".to_string(), "#f0f0f0".to_string()];
        let char_set = vec!['+', 'x'];
        let mut ctx = EffectContext {
            rng: &mut rng,
            scheduler: &mut scheduler,
            palette: &palette,
            char_set: &char_set,
        };

        let mut spread = radial(2, 1);
        spread.start(&mut ctx);
        assert_eq!(spread.live(), 1);
        assert_eq!(ctx.scheduler.pending_spawns(), 0);
        let center = spread.pool().units()[0].pos();

        // Growing for radius + 1 ticks
        for _ in 0..3 {
            let frame = spread.tick(&mut ctx);
            assert!(!frame.is_empty());
            assert_eq!(spread.pool().units()[0].pos(), center);
        }
        assert_eq!(spread.pool().units()[0].phase(), Phase::Fading);

        // Fading for fade_steps ticks
        spread.tick(&mut ctx);
        let frame = spread.tick(&mut ctx);
        assert_eq!(spread.live(), 0);
        assert_eq!(ctx.scheduler.pending_spawns(), 1);

        // Last fade tick shows the original glyphs again
        let row = &frame[center.row];
        assert!(row.iter().all(|s| s.text.chars().all(|c| c == 'R')));
        assert!(spread.pool().grid().contains(CellPos::new(center.row, center.col)));
    }

    #[test]
    fn test_start_schedules_remaining_points() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut scheduler = Scheduler::new(Duration::from_millis(40));
        let palette = vec!["#203040".to_string()];
        let char_set = vec!['+'];
        let mut ctx = EffectContext {
            rng: &mut rng,
            scheduler: &mut scheduler,
            palette: &palette,
            char_set: &char_set,
        };
        let mut spread = radial(1, 3);
        spread.start(&mut ctx);
        assert_eq!(spread.live(), 1);
        assert_eq!(ctx.scheduler.pending_spawns(), 2);
    }

    #[test]
    fn test_spawned_points_keep_their_distance() {
        let palette = vec!["#203040".to_string()];
        let char_set = vec!['+'];
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut scheduler = Scheduler::new(Duration::from_millis(40));
            let mut ctx = EffectContext {
                rng: &mut rng,
                scheduler: &mut scheduler,
                palette: &palette,
                char_set: &char_set,
            };
            let grid = GridFormatter::default().format(&"R".repeat(40 * 40), 320);
            let mut spread = RadialSpread::new(
                RadialSpreadConfig {
                    spread_radius: 3,
                    max_active_points: 4,
                    ..Default::default()
                },
                grid,
            );
            for _ in 0..4 {
                assert!(spread.try_spawn(&mut ctx));
            }

            let anchors: Vec<CellPos> = spread.pool().units().iter().map(|u| u.pos()).collect();
            for (i, a) in anchors.iter().enumerate() {
                for b in &anchors[i + 1..] {
                    assert!(a.manhattan(b) >= spread.min_separation(), "seed {}: {:?} {:?}", seed, a, b);
                }
            }
        }
    }
}
