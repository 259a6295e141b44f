//! Effect instances and the four scramble variants.
//!
//! - **spot**: independent units pulsing at random cells (grid)
//! - **fuzz**: random cells rewritten every tick, forever (flat text)
//! - **scan**: two cursors dragging scrambled tails (flat text)
//! - **radial**: expanding scrambled diamonds that fade out (grid)
//!
//! # Architecture
//!
//! ```text
//! EffectInstance
//! ├── Scheduler (virtual clock: tick + spawn timers)
//! ├── rng (seedable)
//! └── VariantState
//!     ├── SpotPulse ──┐
//!     ├── RadialSpread┴── UnitPool (grid + AnimatedUnit lifecycle)
//!     ├── GlobalFuzz
//!     └── LinearScan
//! ```

pub mod fuzz;
pub mod pool;
pub mod radial;
pub mod scan;
pub mod scheduler;
pub mod spot;

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::config::{
    EffectConfig, GlobalFuzzConfig, LinearScanConfig, RadialSpreadConfig, SpotPulseConfig, Variant,
};
use crate::core::grid::{GridFormatter, Surface};
use crate::ui::segments::Frame;

pub use fuzz::GlobalFuzz;
pub use radial::RadialSpread;
pub use scan::LinearScan;
pub use scheduler::{Event, Scheduler, TimerId};
pub use spot::SpotPulse;

/// Ticks replayed by one `advance` before the clock skips ahead
pub const MAX_CATCH_UP_TICKS: usize = 64;

/// Variant selection with its validated options
#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    SpotPulse(SpotPulseConfig),
    GlobalFuzz(GlobalFuzzConfig),
    LinearScan(LinearScanConfig),
    RadialSpread(RadialSpreadConfig),
}

impl EffectKind {
    pub fn variant(&self) -> Variant {
        match self {
            EffectKind::SpotPulse(_) => Variant::SpotPulse,
            EffectKind::GlobalFuzz(_) => Variant::GlobalFuzz,
            EffectKind::LinearScan(_) => Variant::LinearScan,
            EffectKind::RadialSpread(_) => Variant::RadialSpread,
        }
    }

    /// Validate the wrapped variant options
    pub fn validated(self) -> Self {
        match self {
            EffectKind::SpotPulse(c) => EffectKind::SpotPulse(c.validated()),
            EffectKind::GlobalFuzz(c) => EffectKind::GlobalFuzz(c.validated()),
            EffectKind::LinearScan(c) => EffectKind::LinearScan(c.validated()),
            EffectKind::RadialSpread(c) => EffectKind::RadialSpread(c.validated()),
        }
    }
}

/// Returned once by [`EffectInstance::stop`]: the caller should put the
/// untouched source text back on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restore {
    pub text: String,
}

/// Everything a variant may touch while handling an event
pub struct EffectContext<'a, R: ?Sized> {
    pub rng: &'a mut R,
    pub scheduler: &'a mut Scheduler,
    pub palette: &'a [String],
    pub char_set: &'a [char],
}

/// Uniform pause in `[min_ms, max_ms]`
pub(crate) fn random_pause<R: Rng + ?Sized>(rng: &mut R, min_ms: u64, max_ms: u64) -> Duration {
    let (lo, hi) = if min_ms <= max_ms { (min_ms, max_ms) } else { (max_ms, min_ms) };
    Duration::from_millis(rng.gen_range(lo..=hi))
}

enum VariantState {
    Spot(SpotPulse),
    Fuzz(GlobalFuzz),
    Scan(LinearScan),
    Radial(RadialSpread),
}

/// One running effect over one piece of text.
///
/// Instances are fully independent; all timer handles and unit collections
/// live inside.
pub struct EffectInstance<R: Rng = StdRng> {
    source: String,
    surface: Surface,
    config: EffectConfig,
    rng: R,
    scheduler: Scheduler,
    state: VariantState,
    ticks: u64,
    stopped: bool,
}

impl EffectInstance<StdRng> {
    /// Create and start an effect seeded from the OS
    pub fn new(source: impl Into<String>, surface: Surface, config: EffectConfig) -> Self {
        Self::with_rng(source, surface, config, StdRng::from_entropy())
    }

    pub fn with_seed(
        source: impl Into<String>,
        surface: Surface,
        config: EffectConfig,
        seed: u64,
    ) -> Self {
        Self::with_rng(source, surface, config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> EffectInstance<R> {
    /// Create and start an effect drawing randomness from `rng`.
    ///
    /// `config` is validated again here, so hand-built options are
    /// corrected the same way file options are.
    pub fn with_rng(
        source: impl Into<String>,
        surface: Surface,
        config: EffectConfig,
        rng: R,
    ) -> Self {
        let source = source.into();
        let config = config.validated();
        let formatter = GridFormatter::new(config.grid.char_width_px, config.grid.min_columns);
        let grid = || formatter.format(&source, surface.width_px);
        let state = match &config.kind {
            EffectKind::SpotPulse(c) => VariantState::Spot(SpotPulse::new(c.clone(), grid())),
            EffectKind::GlobalFuzz(c) => VariantState::Fuzz(GlobalFuzz::new(c.clone(), &source)),
            EffectKind::LinearScan(c) => VariantState::Scan(LinearScan::new(c.clone(), &source)),
            EffectKind::RadialSpread(c) => VariantState::Radial(RadialSpread::new(c.clone(), grid())),
        };

        let mut instance = Self {
            source,
            surface,
            scheduler: Scheduler::new(config.update_interval),
            config,
            rng,
            state,
            ticks: 0,
            stopped: false,
        };
        debug!(
            "Starting {} over {} chars ({}x{} px)",
            instance.variant(),
            instance.source.chars().count(),
            surface.width_px,
            surface.height_px
        );
        instance.start();
        instance
    }

    pub fn variant(&self) -> Variant {
        self.config.variant()
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn source_text(&self) -> &str {
        &self.source
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Virtual time since start
    pub fn elapsed(&self) -> Duration {
        self.scheduler.now()
    }

    /// Units currently animating (active, growing or fading)
    pub fn live_units(&self) -> usize {
        match &self.state {
            VariantState::Spot(s) => s.live(),
            VariantState::Radial(r) => r.live(),
            VariantState::Fuzz(_) | VariantState::Scan(_) => 0,
        }
    }

    /// Concurrency cap of the variant
    pub fn max_units(&self) -> usize {
        match &self.state {
            VariantState::Spot(s) => s.max_units(),
            VariantState::Radial(r) => r.max_units(),
            VariantState::Fuzz(_) | VariantState::Scan(_) => 0,
        }
    }

    pub fn pending_spawns(&self) -> usize {
        self.scheduler.pending_spawns()
    }

    /// Move the clock forward by `elapsed`, running every due spawn and
    /// tick in time order.
    ///
    /// Frames are coalesced: when several ticks fall due in one call, each
    /// still runs, but only the frame of the last one is returned since it
    /// supersedes the others on screen. Returns `None` if no tick ran.
    pub fn advance(&mut self, elapsed: Duration) -> Option<Frame> {
        if self.stopped {
            return None;
        }
        let until = self.scheduler.now() + elapsed;
        let mut frame = None;
        let mut ticks = 0;

        while let Some(event) = self.scheduler.next_event(until) {
            match event {
                Event::Spawn(id) => {
                    trace!("Spawn timer {:?} fired", id);
                    self.dispatch_spawn();
                }
                Event::Tick => {
                    frame = Some(self.run_tick());
                    ticks += 1;
                    if ticks >= MAX_CATCH_UP_TICKS {
                        debug!("Dropping tick backlog at {:?}", until);
                        self.scheduler.reanchor(until);
                    }
                }
            }
        }
        frame
    }

    /// Run one tick right now
    pub fn update(&mut self) -> Option<Frame> {
        if self.stopped {
            return None;
        }
        Some(self.run_tick())
    }

    /// Drop all animation state and start spawning again
    pub fn reset(&mut self) {
        if self.stopped {
            return;
        }
        debug!("Resetting {}", self.variant());
        self.scheduler.cancel_spawns();
        match &mut self.state {
            VariantState::Spot(s) => s.reset(),
            VariantState::Fuzz(f) => f.reset(),
            VariantState::Scan(s) => s.reset(),
            VariantState::Radial(r) => r.reset(),
        }
        self.start();
    }

    /// Cancel the tick and every pending timer. The first call hands back
    /// the original text to restore; later calls return `None`.
    pub fn stop(&mut self) -> Option<Restore> {
        if self.stopped {
            return None;
        }
        debug!(
            "Stopping {} after {} ticks, cancelling {} timer(s)",
            self.variant(),
            self.ticks,
            self.scheduler.pending_spawns()
        );
        self.scheduler.cancel_all();
        self.stopped = true;
        Some(Restore {
            text: self.source.clone(),
        })
    }

    fn start(&mut self) {
        let mut ctx = EffectContext {
            rng: &mut self.rng,
            scheduler: &mut self.scheduler,
            palette: &self.config.palette,
            char_set: &self.config.char_set,
        };
        match &mut self.state {
            VariantState::Spot(s) => s.start(&mut ctx),
            VariantState::Radial(r) => r.start(&mut ctx),
            VariantState::Fuzz(_) | VariantState::Scan(_) => {}
        }
    }

    fn dispatch_spawn(&mut self) {
        let mut ctx = EffectContext {
            rng: &mut self.rng,
            scheduler: &mut self.scheduler,
            palette: &self.config.palette,
            char_set: &self.config.char_set,
        };
        match &mut self.state {
            VariantState::Spot(s) => {
                s.try_spawn(&mut ctx);
            }
            VariantState::Radial(r) => {
                r.try_spawn(&mut ctx);
            }
            VariantState::Fuzz(_) | VariantState::Scan(_) => {}
        }
    }

    fn run_tick(&mut self) -> Frame {
        self.ticks += 1;
        let mut ctx = EffectContext {
            rng: &mut self.rng,
            scheduler: &mut self.scheduler,
            palette: &self.config.palette,
            char_set: &self.config.char_set,
        };
        let frame = match &mut self.state {
            VariantState::Spot(s) => s.tick(&mut ctx),
            VariantState::Fuzz(f) => f.tick(&mut ctx),
            VariantState::Scan(s) => s.tick(&mut ctx),
            VariantState::Radial(r) => r.tick(&mut ctx),
        };
        trace!("Tick {} rendered {} row(s)", self.ticks, frame.len());
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ui::segments::frame_text;
    use proptest::prelude::*;

    fn spot_config(spot: SpotPulseConfig) -> EffectConfig {
        let mut config = Config::default().effect_config(Variant::SpotPulse);
        config.kind = EffectKind::SpotPulse(spot.validated());
        config
    }

    fn single_spot() -> EffectConfig {
        spot_config(SpotPulseConfig {
            min_active_chars: 1,
            max_active_chars: 1,
            min_change_count: 3,
            max_change_count: 3,
            fade_steps: 2,
            ..Default::default()
        })
    }

    #[test]
    fn test_hello_world_lifecycle() {
        let mut effect = EffectInstance::with_seed("HELLOWORLD", Surface::new(80, 16), single_spot(), 42);
        assert_eq!(effect.live_units(), 1);

        let mut changed_at = None;
        for tick in 1..=3 {
            let frame = effect.update().unwrap();
            let text = frame_text(&frame);
            assert_eq!(frame.len(), 1);
            assert_eq!(text.chars().count(), 10);
            let diff: Vec<usize> = text
                .chars()
                .zip("HELLOWORLD".chars())
                .enumerate()
                .filter(|(_, (a, b))| a != b)
                .map(|(i, _)| i)
                .collect();
            // The scrambled glyph may coincide with the original letter
            assert!(diff.len() <= 1, "tick {}: {}", tick, text);
            assert!(frame[0].iter().any(|s| s.color.is_some()), "tick {}", tick);
            if let Some(&i) = diff.first() {
                changed_at.get_or_insert(i);
            }
        }

        // First fade tick: still colored
        let frame = effect.update().unwrap();
        assert!(frame[0].iter().any(|s| s.color.is_some()));
        assert_eq!(effect.live_units(), 1);

        // Second fade tick: original glyph back, color mid-fade
        let frame = effect.update().unwrap();
        assert_eq!(frame_text(&frame), "HELLOWORLD");
        assert!(frame[0].iter().any(|s| s.color.is_some()));
        assert_eq!(effect.live_units(), 0);
        assert_eq!(effect.pending_spawns(), 1);

        // Untouched until the replacement spawns
        let frame = effect.update().unwrap();
        assert_eq!(frame[0].len(), 1);
        assert_eq!(frame[0][0].text, "HELLOWORLD");
        assert_eq!(frame[0][0].color, None);

        // Replacement arrives after the pause
        effect.advance(Duration::from_millis(2000));
        assert_eq!(effect.pending_spawns() + effect.live_units(), 1);
        assert!(changed_at.map_or(true, |i| i < 10));
    }

    #[test]
    fn test_empty_text_is_noop() {
        let mut effect = EffectInstance::with_seed("", Surface::new(0, 0), single_spot(), 1);
        assert_eq!(effect.live_units(), 0);
        assert_eq!(effect.update(), Some(Vec::new()));
        assert_eq!(effect.advance(Duration::from_secs(5)), Some(Vec::new()));
        assert_eq!(effect.live_units(), 0);
        assert_eq!(effect.pending_spawns(), 0);
    }

    #[test]
    fn test_stop_is_quiescent() {
        let mut effect = EffectInstance::with_seed("SOME SCRAMBLED TEXT", Surface::new(80, 32), single_spot(), 5);
        effect.advance(Duration::from_millis(500));
        let ticks = effect.ticks();

        let restore = effect.stop().unwrap();
        assert_eq!(restore.text, "SOME SCRAMBLED TEXT");
        assert_eq!(effect.pending_spawns(), 0);
        assert_eq!(effect.stop(), None);

        let live = effect.live_units();
        assert_eq!(effect.advance(Duration::from_secs(60)), None);
        assert_eq!(effect.update(), None);
        effect.reset();
        assert_eq!(effect.ticks(), ticks);
        assert_eq!(effect.live_units(), live);
    }

    #[test]
    fn test_reset_restarts_spawning() {
        let config = spot_config(SpotPulseConfig {
            min_active_chars: 2,
            max_active_chars: 4,
            ..Default::default()
        });
        let mut effect = EffectInstance::with_seed("ABCDEFGHIJKLMNOPQRSTUVWXYZ", Surface::new(80, 32), config, 8);
        effect.advance(Duration::from_secs(3));
        effect.reset();
        assert_eq!(effect.live_units(), 2);
        assert_eq!(effect.pending_spawns(), 0);
        assert!(!effect.is_stopped());
    }

    #[test]
    fn test_catch_up_is_bounded() {
        let mut effect = EffectInstance::with_seed("CATCHUP", Surface::new(80, 16), single_spot(), 3);
        effect.advance(Duration::from_secs(3600));
        assert!(effect.ticks() <= MAX_CATCH_UP_TICKS as u64);
        assert_eq!(effect.elapsed(), Duration::from_secs(3600));
    }

    #[test]
    fn test_hand_built_config_is_corrected() {
        let mut config = single_spot();
        config.kind = EffectKind::SpotPulse(SpotPulseConfig {
            min_active_chars: 2,
            max_active_chars: 1,
            min_change_count: 9,
            max_change_count: 3,
            ..Default::default()
        });
        config.palette.clear();
        config.char_set.clear();
        config.update_interval = Duration::ZERO;

        let mut effect = EffectInstance::with_seed("UNCHECKED OPTIONS", Surface::new(80, 16), config, 4);
        match &effect.config().kind {
            EffectKind::SpotPulse(spot) => {
                assert_eq!((spot.min_active_chars, spot.max_active_chars), (1, 2));
                assert_eq!((spot.min_change_count, spot.max_change_count), (3, 9));
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert!(!effect.config().palette.is_empty());
        assert!(!effect.config().char_set.is_empty());
        assert_eq!(effect.config().update_interval, Duration::from_millis(1));
        assert_eq!(effect.surface(), Surface::new(80, 16));
        assert_eq!(effect.live_units(), 1);
        assert!(effect.advance(Duration::from_millis(100)).is_some());
    }

    #[test]
    fn test_unbounded_change_rate_is_clamped() {
        let mut config = Config::default().effect_config(Variant::GlobalFuzz);
        config.kind = EffectKind::GlobalFuzz(GlobalFuzzConfig {
            change_rate: f64::INFINITY,
            ..Default::default()
        });

        let mut effect = EffectInstance::with_seed("FUZZ", Surface::new(80, 16), config, 2);
        assert_eq!(
            effect.config().kind,
            EffectKind::GlobalFuzz(GlobalFuzzConfig {
                change_rate: 1.0,
                ..Default::default()
            })
        );
        let frame = effect.update().unwrap();
        assert_eq!(frame_text(&frame).chars().count(), 4);
    }

    #[test]
    fn test_instances_are_independent() {
        let mut a = EffectInstance::with_seed("FIRST", Surface::new(80, 16), single_spot(), 1);
        let mut b = EffectInstance::with_seed("SECOND", Surface::new(80, 16), single_spot(), 1);
        a.advance(Duration::from_millis(300));
        a.stop();
        assert!(b.update().is_some());
        assert_eq!(b.ticks(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_unit_cap_holds(seed: u64, min in 0usize..6, extra in 0usize..6) {
            let config = spot_config(SpotPulseConfig {
                min_active_chars: min,
                max_active_chars: min + extra,
                min_change_count: 1,
                max_change_count: 4,
                fade_steps: 2,
                min_pause_duration: 0,
                max_pause_duration: 80,
                ..Default::default()
            });
            let mut effect = EffectInstance::with_seed("PACKED TEXT GRID", Surface::new(32, 16), config, seed);
            for _ in 0..200 {
                effect.advance(Duration::from_millis(17));
                prop_assert!(effect.live_units() <= effect.max_units());
            }
        }

        #[test]
        fn prop_radial_cap_holds(seed: u64, points in 1usize..5, radius in 0usize..4) {
            let mut config = Config::default().effect_config(Variant::RadialSpread);
            config.kind = EffectKind::RadialSpread(RadialSpreadConfig {
                spread_radius: radius,
                max_active_points: points,
                min_pause_duration: 0,
                max_pause_duration: 60,
                fade_steps: 3,
            });
            let mut effect = EffectInstance::with_seed(&"RADIAL".repeat(20), Surface::new(160, 64), config, seed);
            for _ in 0..200 {
                effect.advance(Duration::from_millis(23));
                prop_assert!(effect.live_units() <= effect.max_units());
            }
        }
    }
}
