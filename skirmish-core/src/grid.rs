//! Grid geometry: cells, orthogonal directions, and the shared arena

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Integer grid coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance: max(|dx|, |dy|)
    pub fn chebyshev(&self, other: Cell) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Squared straight-line distance, exact for ordering
    pub fn distance_squared(&self, other: Cell) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        dx * dx + dy * dy
    }

    /// Straight-line distance
    pub fn euclidean(&self, other: Cell) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        dx.hypot(dy)
    }

    /// Cell one step away in the given direction
    pub fn step(&self, direction: Direction) -> Cell {
        let (dx, dy) = direction.vector();
        Cell::new(self.x + dx, self.y + dy)
    }

    /// The four orthogonal neighbours, in `Direction::ALL` order
    pub fn neighbors(&self) -> impl Iterator<Item = Cell> + '_ {
        Direction::ALL.into_iter().map(move |d| self.step(d))
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Orthogonal movement direction (y grows southwards)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Enumeration order used by move generation
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit vector (dx, dy)
    pub const fn vector(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }
}

/// Grid extents: valid cells are `[0, x_extent) x [0, y_extent)`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub x_extent: i32,
    pub y_extent: i32,
}

impl Bounds {
    pub const fn new(x_extent: i32, y_extent: i32) -> Self {
        Self { x_extent, y_extent }
    }

    /// Check if a cell lies on the grid
    pub fn contains(&self, cell: Cell) -> bool {
        0 <= cell.x && cell.x < self.x_extent && 0 <= cell.y && cell.y < self.y_extent
    }

    /// Length of the grid's diagonal, never below 1
    pub fn diagonal(&self) -> f64 {
        f64::from(self.x_extent).hypot(f64::from(self.y_extent)).max(1.0)
    }

    /// Number of cells on the grid
    pub fn area(&self) -> usize {
        let w = usize::try_from(self.x_extent).unwrap_or(0);
        let h = usize::try_from(self.y_extent).unwrap_or(0);
        w.saturating_mul(h)
    }
}

/// Static battlefield: bounds plus the obstacle set.
///
/// Built once per search and shared read-only between every state of the
/// tree. Successor generation never touches it.
#[derive(Clone, Debug, Default)]
pub struct Arena {
    bounds: Bounds,
    obstacles: FxHashSet<Cell>,
}

impl Arena {
    pub fn new(bounds: Bounds, obstacles: impl IntoIterator<Item = Cell>) -> Self {
        Self {
            bounds,
            obstacles: obstacles.into_iter().collect(),
        }
    }

    /// Arena without obstacles
    pub fn open(x_extent: i32, y_extent: i32) -> Self {
        Self::new(Bounds::new(x_extent, y_extent), std::iter::empty())
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.obstacles.contains(&cell)
    }

    /// In bounds and not an obstacle
    pub fn is_passable(&self, cell: Cell) -> bool {
        self.bounds.contains(cell) && !self.is_obstacle(cell)
    }

    pub fn obstacles(&self) -> impl Iterator<Item = Cell> + '_ {
        self.obstacles.iter().copied()
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }
}
