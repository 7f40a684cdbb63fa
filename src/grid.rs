use rand::Rng;

/// One discrete board position. Coordinates are signed so that a step off
/// the board is still representable for the wall check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub column: i32,
    pub row: i32,
}

impl Cell {
    pub fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    pub fn moved(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Cell::new(self.column + dx, self.row + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Unit vector in (column, row) space; rows grow downwards.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Square board of `side x side` cells laid over a square canvas.
///
/// All conversions are pure. Callers are expected to pass in-range input;
/// `contains` is the only bounds-aware query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    side: i32,
    cell_size: f64,
}

impl Grid {
    /// Builds the grid for a canvas of `board_side_px` pixels cut into
    /// `cell_size_px` cells. Any leftover pixels past the last full cell are unused.
    pub fn from_canvas(board_side_px: u32, cell_size_px: u32) -> Self {
        let side = if cell_size_px == 0 {
            0
        } else {
            (board_side_px / cell_size_px) as i32
        };
        Self {
            side,
            cell_size: cell_size_px as f64,
        }
    }

    pub fn side(&self) -> i32 {
        self.side
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        (self.side.max(0) as usize).pow(2)
    }

    /// Side length of the drawable area in pixels.
    pub fn side_px(&self) -> f64 {
        self.side as f64 * self.cell_size
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.column >= 0 && cell.row >= 0 && cell.column < self.side && cell.row < self.side
    }

    pub fn to_cell(&self, pixel: PixelPoint) -> Cell {
        Cell::new(
            (pixel.x / self.cell_size).floor() as i32,
            (pixel.y / self.cell_size).floor() as i32,
        )
    }

    pub fn to_pixel(&self, cell: Cell) -> PixelRect {
        PixelRect {
            x: cell.column as f64 * self.cell_size,
            y: cell.row as f64 * self.cell_size,
            width: self.cell_size,
            height: self.cell_size,
        }
    }

    /// Uniformly distributed over all `side x side` cells.
    pub fn random_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Cell {
        Cell::new(rng.gen_range(0..self.side), rng.gen_range(0..self.side))
    }

    /// Row-major iteration over every cell of the board.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.side).flat_map(move |row| (0..self.side).map(move |column| Cell::new(column, row)))
    }
}
