//! Global fuzz: every tick a fraction of the text is overwritten with random
//! glyphs in random palette colors. Nothing ever fades back; the text only
//! returns on stop.

use rand::Rng;

use super::EffectContext;
use crate::config::GlobalFuzzConfig;
use crate::core::unit::random_glyph;
use crate::ui::segments::{render_row, Frame};

#[derive(Debug, Clone, PartialEq, Eq)]
enum FuzzCell {
    Glyph { ch: char, color: Option<String> },
    LineBreak,
}

pub struct GlobalFuzz {
    config: GlobalFuzzConfig,
    original: Vec<FuzzCell>,
    cells: Vec<FuzzCell>,
}

impl GlobalFuzz {
    pub fn new(config: GlobalFuzzConfig, source: &str) -> Self {
        let original = build_cells(&config, source);
        Self {
            config,
            cells: original.clone(),
            original,
        }
    }

    /// Number of cells, line breaks included
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells rewritten per tick
    pub fn changes_per_tick(&self) -> usize {
        ((self.cells.len() as f64 * self.config.change_rate).floor() as usize).max(1)
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, ctx: &mut EffectContext<'_, R>) -> Frame {
        let len = self.cells.len();
        if len > 0 {
            for _ in 0..self.changes_per_tick() {
                let idx = ctx.rng.gen_range(0..len);
                if self.cells[idx] == FuzzCell::LineBreak {
                    continue;
                }
                let ch = random_glyph(ctx.char_set, ctx.rng);
                let color = if ctx.palette.is_empty() {
                    None
                } else {
                    Some(ctx.palette[ctx.rng.gen_range(0..ctx.palette.len())].clone())
                };
                self.cells[idx] = FuzzCell::Glyph { ch, color };
            }
        }
        self.render()
    }

    fn render(&self) -> Frame {
        if self.cells.is_empty() {
            return Vec::new();
        }
        self.cells
            .split(|cell| *cell == FuzzCell::LineBreak)
            .map(|line| {
                render_row(line.iter().filter_map(|cell| match cell {
                    FuzzCell::Glyph { ch, color } => Some((*ch, color.clone())),
                    FuzzCell::LineBreak => None,
                }))
            })
            .collect()
    }

    pub fn reset(&mut self) {
        self.cells = self.original.clone();
    }
}

fn build_cells(config: &GlobalFuzzConfig, source: &str) -> Vec<FuzzCell> {
    let chars: Vec<char> = source
        .chars()
        .filter(|&c| c != '\r')
        .map(|c| if c == '\n' && !config.preserve_line_breaks { ' ' } else { c })
        .collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let count = if config.char_count == 0 { chars.len() } else { config.char_count };
    chars
        .iter()
        .cycle()
        .take(count)
        .map(|&c| match c {
            '\n' => FuzzCell::LineBreak,
            ch => FuzzCell::Glyph { ch, color: None },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Scheduler;
    use crate::ui::segments::frame_text;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn run(fuzz: &mut GlobalFuzz, ticks: usize, seed: u64) -> Frame {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut scheduler = Scheduler::new(Duration::from_millis(30));
        let palette = vec!["#ff00ff".to_string()];
        let char_set = vec!['~'];
        let mut ctx = EffectContext {
            rng: &mut rng,
            scheduler: &mut scheduler,
            palette: &palette,
            char_set: &char_set,
        };
        let mut frame = Vec::new();
        for _ in 0..ticks {
            frame = fuzz.tick(&mut ctx);
        }
        frame
    }

    #[test]
    fn test_line_breaks_preserved() {
        let mut fuzz = GlobalFuzz::new(
            GlobalFuzzConfig {
                change_rate: 1.0,
                ..Default::default()
            },
            "ABC\nDE",
        );
        assert_eq!(fuzz.changes_per_tick(), 6);
        let frame = run(&mut fuzz, 50, 1);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame_text(&frame), "~~~\n~~");
        assert_eq!(frame[0][0].color.as_deref(), Some("#ff00ff"));
    }

    #[test]
    fn test_line_breaks_flattened() {
        let mut fuzz = GlobalFuzz::new(
            GlobalFuzzConfig {
                change_rate: 0.0,
                preserve_line_breaks: false,
                ..Default::default()
            },
            "AB\r\nCD",
        );
        assert_eq!(fuzz.len(), 5);
        assert_eq!(fuzz.changes_per_tick(), 1);
        let frame = run(&mut fuzz, 1, 3);
        assert_eq!(frame.len(), 1);
        let changed = frame_text(&frame).chars().filter(|&c| c == '~').count();
        assert_eq!(changed, 1);
    }

    #[test]
    fn test_char_count_cycles_source() {
        let fuzz = GlobalFuzz::new(
            GlobalFuzzConfig {
                char_count: 7,
                ..Default::default()
            },
            "XY",
        );
        assert_eq!(fuzz.len(), 7);
        assert_eq!(frame_text(&fuzz.render()), "XYXYXYX");
    }

    #[test]
    fn test_empty_and_reset() {
        let mut empty = GlobalFuzz::new(GlobalFuzzConfig::default(), "");
        assert!(run(&mut empty, 3, 0).is_empty());

        let mut fuzz = GlobalFuzz::new(
            GlobalFuzzConfig {
                change_rate: 1.0,
                ..Default::default()
            },
            "RESET",
        );
        run(&mut fuzz, 10, 2);
        fuzz.reset();
        assert_eq!(frame_text(&fuzz.render()), "RESET");
    }
}
