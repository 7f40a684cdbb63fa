use crate::grid::{Cell, Grid};
use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;

/// Random draws attempted before falling back to scanning the free cells.
const MAX_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no free cell left on a {side}x{side} board")]
pub struct BoardFull {
    pub side: i32,
}

/// Picks a cell for the next food, never one in `excluded`.
///
/// Rejection sampling keeps the common case cheap. Once the board is crowded
/// enough for the draws to keep missing, the free cells are enumerated and one
/// is chosen uniformly, so the call always terminates.
pub fn spawn<R: Rng + ?Sized>(
    grid: &Grid,
    excluded: &HashSet<Cell>,
    rng: &mut R,
) -> Result<Cell, BoardFull> {
    let free = grid.cell_count().saturating_sub(excluded.len());
    if free == 0 {
        return Err(BoardFull { side: grid.side() });
    }

    for _ in 0..MAX_ATTEMPTS {
        let cell = grid.random_cell(rng);
        if !excluded.contains(&cell) {
            return Ok(cell);
        }
    }

    log::debug!(
        "food: {} random draws missed, scanning {} free cells",
        MAX_ATTEMPTS,
        free
    );
    grid.cells()
        .filter(|cell| !excluded.contains(cell))
        .choose(rng)
        .ok_or(BoardFull { side: grid.side() })
}
