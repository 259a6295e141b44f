//! Spawn position selection.
//!
//! New units are placed at random grid cells, keeping a best-effort
//! Manhattan separation from every unit already on the grid. Two units never
//! share a cell.

use rand::Rng;

use super::grid::{CellPos, Grid};

/// Random picks tried before the separation constraint is dropped
pub const MAX_PLACEMENT_TRIES: usize = 10;

/// Pick a cell for a new unit.
///
/// Returns `None` only when the grid has no free cell at all.
pub fn select_position<R: Rng + ?Sized>(
    grid: &Grid,
    occupied: &[CellPos],
    min_separation: usize,
    rng: &mut R,
) -> Option<CellPos> {
    let cells = grid.cell_count();
    if cells == 0 {
        return None;
    }

    for _ in 0..MAX_PLACEMENT_TRIES {
        let pos = grid.pos_of(rng.gen_range(0..cells))?;
        let clear = occupied
            .iter()
            .all(|other| *other != pos && other.manhattan(&pos) >= min_separation);
        if clear {
            return Some(pos);
        }
    }

    // Packed grid: ignore separation, only avoid occupied cells
    let free = cells.saturating_sub(occupied.len());
    if free == 0 {
        return None;
    }
    let pos = grid.pos_of(rng.gen_range(0..cells))?;
    if !occupied.contains(&pos) {
        return Some(pos);
    }
    let mut skip = rng.gen_range(0..free);
    for index in 0..cells {
        let candidate = grid.pos_of(index)?;
        if occupied.contains(&candidate) {
            continue;
        }
        if skip == 0 {
            return Some(candidate);
        }
        skip -= 1;
    }
    None
}
