use crate::grid::{Cell, Direction, Grid};
use std::collections::{HashSet, VecDeque};

/// What a single `advance` did to the snake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved,
    Ate,
    HitWall,
    HitSelf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    body: VecDeque<Cell>,
    heading: Direction,
    pending: Option<Direction>,
}

impl Snake {
    /// Lays out `length` cells with the head at `head` and the rest of the
    /// body trailing behind it, opposite to `heading`.
    pub fn new(head: Cell, heading: Direction, length: usize) -> Self {
        let length = length.max(1);
        let mut body = VecDeque::with_capacity(length);
        let mut cell = head;
        for _ in 0..length {
            body.push_back(cell);
            cell = cell.moved(heading.opposite());
        }
        Self {
            body,
            heading,
            pending: None,
        }
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn tail(&self) -> Cell {
        self.body[self.body.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn pending(&self) -> Option<Direction> {
        self.pending
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    pub fn occupied(&self) -> HashSet<Cell> {
        self.body.iter().copied().collect()
    }

    fn is_reversal(&self, direction: Direction) -> bool {
        self.body.len() > 1 && direction == self.heading.opposite()
    }

    /// Records a turn for the next tick. Only the latest accepted turn is kept.
    /// Returns false when the turn would reverse the snake into its own neck.
    pub fn change_movement(&mut self, direction: Direction) -> bool {
        if self.is_reversal(direction) {
            return false;
        }
        self.pending = Some(direction);
        true
    }

    /// Moves one cell along the pending direction (or the current heading).
    ///
    /// On a collision the body is left as it was. Otherwise the new head is
    /// prepended and the tail is dropped unless the head landed on `food`.
    pub fn advance(&mut self, food: Option<Cell>, grid: &Grid) -> Advance {
        if let Some(direction) = self.pending.take() {
            if !self.is_reversal(direction) {
                self.heading = direction;
            }
        }

        let next = self.head().moved(self.heading);
        if !grid.contains(next) {
            return Advance::HitWall;
        }

        let eats = food == Some(next);
        // The tail moves out of the way this tick unless the snake grows
        let solid = if eats { self.body.len() } else { self.body.len() - 1 };
        if self.body.iter().take(solid).any(|cell| *cell == next) {
            return Advance::HitSelf;
        }

        self.body.push_front(next);
        if eats {
            Advance::Ate
        } else {
            self.body.pop_back();
            Advance::Moved
        }
    }
}
