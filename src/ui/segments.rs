//! Segment rendering: the only output callers consume.
//!
//! A frame is a list of rows, each row a list of `(text, color)` segments.
//! Neighbouring characters with the same color are merged into one segment.

use crate::core::grid::{CellPos, Grid, Overlay};

/// A run of text sharing one color (`None` = no override)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub color: Option<String>,
}

impl Segment {
    pub fn new(text: impl Into<String>, color: Option<String>) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

pub type Row = Vec<Segment>;

/// One rendered frame
pub type Frame = Vec<Row>;

/// Merge a row of colored characters into segments
pub fn render_row<I>(cells: I) -> Row
where
    I: IntoIterator<Item = (char, Option<String>)>,
{
    let mut row: Row = Vec::new();
    for (ch, color) in cells {
        match row.last_mut() {
            Some(last) if last.color == color => last.text.push(ch),
            _ => row.push(Segment::new(ch.to_string(), color)),
        }
    }
    row
}

/// Render the base grid with `overlay` applied on top
pub fn render_grid(grid: &Grid, overlay: &Overlay) -> Frame {
    grid.rows()
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            render_row(row.iter().enumerate().map(|(col_idx, &ch)| {
                match overlay.get(&CellPos::new(row_idx, col_idx)) {
                    Some(cell) => (cell.glyph, cell.color.clone()),
                    None => (ch, None),
                }
            }))
        })
        .collect()
}

/// Plain text of a frame, one line per row
pub fn frame_text(frame: &Frame) -> String {
    frame
        .iter()
        .map(|row| row.iter().map(|s| s.text.as_str()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::{GridFormatter, OverlayCell};

    #[test]
    fn test_runs_are_merged() {
        let red = Some("#ff0000".to_string());
        let row = render_row(vec![
            ('a', None),
            ('b', None),
            ('c', red.clone()),
            ('d', red.clone()),
            ('e', None),
        ]);
        assert_eq!(
            row,
            vec![
                Segment::new("ab", None),
                Segment::new("cd", red),
                Segment::new("e", None),
            ]
        );
        assert!(render_row(Vec::new()).is_empty());
    }

    #[test]
    fn test_grid_with_overlay() {
        let grid = GridFormatter::default().format("HELLOWORLD", 80);
        let mut overlay = Overlay::new();
        overlay.insert(CellPos::new(0, 4), OverlayCell::new('#', Some("#00ff00".to_string())));

        let frame = render_grid(&grid, &overlay);
        assert_eq!(frame.len(), 1);
        assert_eq!(
            frame[0],
            vec![
                Segment::new("HELL", None),
                Segment::new("#", Some("#00ff00".to_string())),
                Segment::new("WORLD", None),
            ]
        );
        assert_eq!(frame_text(&frame), "HELL#WORLD");
    }
}
