//! Character grid built from the source text.
//!
//! Grid-based effects (spot pulse, radial spread) drop all layout whitespace
//! and re-flow the text into rows sized to the target surface. The grid is
//! immutable once built; animation state lives in a sparse overlay.

use std::collections::HashMap;

/// Fallback row height when the surface reports zero height
pub const MIN_ROW_HEIGHT_PX: u32 = 16;

/// Default estimate of a glyph's width in pixels
pub const DEFAULT_CHAR_WIDTH_PX: u32 = 8;

/// Default lower bound on grid columns
pub const DEFAULT_MIN_COLUMNS: usize = 8;

/// One overlaid cell: replacement glyph plus optional color override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayCell {
    pub glyph: char,
    pub color: Option<String>,
}

impl OverlayCell {
    pub fn new(glyph: char, color: Option<String>) -> Self {
        Self { glyph, color }
    }
}

/// Sparse per-tick overlay applied on top of the immutable grid
pub type Overlay = HashMap<CellPos, OverlayCell>;

/// Rendering surface descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Surface {
    pub width_px: u32,
    pub height_px: u32,
}

impl Surface {
    pub const fn new(width_px: u32, height_px: u32) -> Self {
        Self { width_px, height_px }
    }

    /// Number of text rows the surface can show at `row_height_px`.
    /// A zero-height surface still shows one row.
    pub fn row_capacity(&self, row_height_px: u32) -> usize {
        let row_height = row_height_px.max(1);
        (self.height_px.max(row_height_px) / row_height).max(1) as usize
    }
}

/// Grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn manhattan(&self, other: &CellPos) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

/// Rows of single characters. Every row but the last holds exactly
/// `columns` characters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grid {
    rows: Vec<Vec<char>>,
    columns: usize,
    len: usize,
}

impl Grid {
    pub fn rows(&self) -> &[Vec<char>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, pos: CellPos) -> Option<char> {
        self.rows.get(pos.row).and_then(|row| row.get(pos.col)).copied()
    }

    /// Position of the `index`-th cell in reading order
    pub fn pos_of(&self, index: usize) -> Option<CellPos> {
        if index >= self.len {
            return None;
        }
        Some(CellPos::new(index / self.columns, index % self.columns))
    }

    pub fn contains(&self, pos: CellPos) -> bool {
        self.get(pos).is_some()
    }
}

/// Flows text into a [`Grid`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridFormatter {
    pub char_width_px: u32,
    pub min_columns: usize,
}

impl Default for GridFormatter {
    fn default() -> Self {
        Self {
            char_width_px: DEFAULT_CHAR_WIDTH_PX,
            min_columns: DEFAULT_MIN_COLUMNS,
        }
    }
}

impl GridFormatter {
    pub fn new(char_width_px: u32, min_columns: usize) -> Self {
        Self {
            char_width_px: char_width_px.max(1),
            min_columns: min_columns.max(1),
        }
    }

    /// Column count for a surface width; never below `min_columns`
    pub fn columns_for(&self, surface_width_px: u32) -> usize {
        let fit = (surface_width_px / self.char_width_px.max(1)) as usize;
        fit.max(self.min_columns.max(1))
    }

    pub fn format(&self, text: &str, surface_width_px: u32) -> Grid {
        let columns = self.columns_for(surface_width_px);
        let cells: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        let len = cells.len();
        let rows = cells.chunks(columns).map(|chunk| chunk.to_vec()).collect();
        Grid { rows, columns, len }
    }
}
