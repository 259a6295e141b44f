//! Linear scan: cursors sweep the text and drag a scrambled tail behind
//! them, bright at the head and dimming toward the end. Cells outside the
//! tails show the original text.

use std::collections::HashMap;

use rand::Rng;

use super::EffectContext;
use crate::config::LinearScanConfig;
use crate::core::color::tail_color;
use crate::core::unit::random_glyph;
use crate::ui::segments::{render_row, Frame};

pub struct LinearScan {
    config: LinearScanConfig,
    cells: Vec<char>,
    forward: usize,
    backward: usize,
}

impl LinearScan {
    pub fn new(config: LinearScanConfig, source: &str) -> Self {
        let cells: Vec<char> = if config.preserve_layout {
            source.chars().filter(|&c| c != '\r').collect()
        } else {
            source.split_whitespace().collect::<Vec<_>>().join(" ").chars().collect()
        };
        let backward = cells.len().saturating_sub(1);
        Self {
            config,
            cells,
            forward: 0,
            backward,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Forward cursor, plus the backward one when scanning both ways
    pub fn cursors(&self) -> (usize, Option<usize>) {
        let backward = self.config.bidirectional.then_some(self.backward);
        (self.forward, backward)
    }

    fn scrambles(&self, ch: char) -> bool {
        if ch == '\n' {
            return false;
        }
        !(self.config.preserve_layout && ch.is_whitespace())
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, ctx: &mut EffectContext<'_, R>) -> Frame {
        let len = self.cells.len();
        if len == 0 {
            return Vec::new();
        }

        // cell index -> (offset from head, glyph, color); nearest head wins
        let mut tails: HashMap<usize, (usize, char, Option<String>)> = HashMap::new();
        let tail = self.config.tail_length.min(len);
        let mut heads = vec![(self.forward, false)];
        if self.config.bidirectional {
            heads.push((self.backward, true));
        }

        for (head, reverse) in heads {
            for offset in 0..tail {
                let idx = if reverse {
                    (head + offset) % len
                } else {
                    (head + len - offset % len) % len
                };
                if !self.scrambles(self.cells[idx]) {
                    continue;
                }
                if tails.get(&idx).map_or(false, |(prev, _, _)| *prev <= offset) {
                    continue;
                }
                let glyph = random_glyph(ctx.char_set, ctx.rng);
                let color = tail_color(offset, self.config.tail_length, ctx.palette).map(str::to_string);
                tails.insert(idx, (offset, glyph, color));
            }
        }

        let step = self.config.travel_speed % len;
        self.forward = (self.forward + step) % len;
        self.backward = (self.backward + len - step) % len;

        self.render(&tails)
    }

    fn render(&self, tails: &HashMap<usize, (usize, char, Option<String>)>) -> Frame {
        let mut frame = Vec::new();
        let mut line = Vec::new();
        for (idx, &ch) in self.cells.iter().enumerate() {
            if ch == '\n' {
                frame.push(render_row(line.drain(..)));
                continue;
            }
            match tails.get(&idx) {
                Some((_, glyph, color)) => line.push((*glyph, color.clone())),
                None => line.push((ch, None)),
            }
        }
        frame.push(render_row(line));
        frame
    }

    pub fn reset(&mut self) {
        self.forward = 0;
        self.backward = self.cells.len().saturating_sub(1);
    }
}
