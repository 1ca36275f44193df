//! Obstacle-aware shortest paths on the grid
//!
//! [`AStar`] searches four-directional moves with unit step cost and a
//! Chebyshev heuristic, which never overestimates on this move set, so the
//! first time the goal is popped its path is optimal.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::grid::{Arena, Cell};

// ============================================================================
// PATH
// ============================================================================

/// Cells to walk, in travel order.
///
/// Excludes the start cell and ends on the goal, so [`Path::peek_next`] is
/// always the next cell one step closer to the goal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    cells: VecDeque<Cell>,
}

impl Path {
    pub fn new(cells: impl IntoIterator<Item = Cell>) -> Self {
        Self {
            cells: cells.into_iter().collect(),
        }
    }

    /// Next cell to move into
    pub fn peek_next(&self) -> Option<Cell> {
        self.cells.front().copied()
    }

    /// Consume the next cell
    pub fn advance(&mut self) -> Option<Cell> {
        self.cells.pop_front()
    }

    /// Final cell, if any steps remain
    pub fn goal(&self) -> Option<Cell> {
        self.cells.back().copied()
    }

    /// Number of steps left
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Total cost with unit step cost
    pub fn cost(&self) -> u32 {
        u32::try_from(self.cells.len()).unwrap_or(u32::MAX)
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().copied()
    }
}

// ============================================================================
// PATHFINDER CONTRACT
// ============================================================================

/// Failure modes of a path search
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("no path from {start} to {goal}")]
    NoPath { start: Cell, goal: Cell },

    #[error("{0} lies outside the arena")]
    OutOfBounds(Cell),

    #[error("{0} is an obstacle")]
    Blocked(Cell),
}

/// Shortest-path search between two cells of an arena.
///
/// Implementations must be pure: the same inputs always give a path of the
/// same length.
pub trait Pathfinder: Send + Sync {
    fn shortest_path(&self, start: Cell, goal: Cell, arena: &Arena) -> Result<Path, PathError>;
}

impl<P: Pathfinder + ?Sized> Pathfinder for std::sync::Arc<P> {
    fn shortest_path(&self, start: Cell, goal: Cell, arena: &Arena) -> Result<Path, PathError> {
        (**self).shortest_path(start, goal, arena)
    }
}

// ============================================================================
// A* SEARCH
// ============================================================================

/// A* over orthogonal neighbours
#[derive(Clone, Copy, Debug, Default)]
pub struct AStar;

/// Node in the search arena; parents are indices into the node list
#[derive(Clone, Copy, Debug)]
struct Node {
    cell: Cell,
    parent: Option<usize>,
    g: u32,
}

/// Open-set entry. Ordered so the max-heap pops the lowest f first, then the
/// lowest h, then the oldest entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenEntry {
    f: u32,
    h: u32,
    seq: u32,
    node: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn heuristic(cell: Cell, goal: Cell) -> u32 {
    cell.chebyshev(goal).unsigned_abs()
}

impl AStar {
    pub fn new() -> Self {
        Self
    }

    fn rebuild(nodes: &[Node], mut index: usize) -> Path {
        let mut cells = VecDeque::new();
        while let Some(parent) = nodes[index].parent {
            cells.push_front(nodes[index].cell);
            index = parent;
        }
        Path { cells }
    }
}

impl Pathfinder for AStar {
    fn shortest_path(&self, start: Cell, goal: Cell, arena: &Arena) -> Result<Path, PathError> {
        let bounds = arena.bounds();
        for cell in [start, goal] {
            if !bounds.contains(cell) {
                return Err(PathError::OutOfBounds(cell));
            }
            if arena.is_obstacle(cell) {
                return Err(PathError::Blocked(cell));
            }
        }
        if start == goal {
            return Ok(Path::default());
        }

        let mut nodes = vec![Node {
            cell: start,
            parent: None,
            g: 0,
        }];
        let mut open = BinaryHeap::new();
        let mut best_g: FxHashMap<Cell, u32> = FxHashMap::default();
        let mut closed: FxHashSet<Cell> = FxHashSet::default();
        let mut seq = 0u32;

        let h = heuristic(start, goal);
        open.push(OpenEntry { f: h, h, seq, node: 0 });
        best_g.insert(start, 0);

        while let Some(entry) = open.pop() {
            let current = nodes[entry.node];

            // Superseded by a cheaper entry pushed later
            if closed.contains(&current.cell) {
                continue;
            }

            if current.cell == goal {
                let path = Self::rebuild(&nodes, entry.node);
                tracing::trace!(
                    %start, %goal,
                    expanded = closed.len(),
                    length = path.len(),
                    "path found"
                );
                return Ok(path);
            }

            closed.insert(current.cell);

            let g = current.g + 1;
            for neighbor in current.cell.neighbors() {
                if !arena.is_passable(neighbor) || closed.contains(&neighbor) {
                    continue;
                }
                if best_g.get(&neighbor).is_some_and(|&known| known <= g) {
                    continue;
                }
                best_g.insert(neighbor, g);

                nodes.push(Node {
                    cell: neighbor,
                    parent: Some(entry.node),
                    g,
                });
                seq += 1;
                let h = heuristic(neighbor, goal);
                open.push(OpenEntry {
                    f: g + h,
                    h,
                    seq,
                    node: nodes.len() - 1,
                });
            }
        }

        tracing::trace!(%start, %goal, expanded = closed.len(), "open set exhausted");
        Err(PathError::NoPath { start, goal })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Bounds;

    fn assert_walkable(path: &Path, start: Cell, arena: &Arena) {
        let mut prev = start;
        for cell in path.cells() {
            assert!(arena.is_passable(cell), "{} is not passable", cell);
            assert_eq!(
                (prev.x - cell.x).abs() + (prev.y - cell.y).abs(),
                1,
                "{} -> {} is not an orthogonal step",
                prev,
                cell
            );
            prev = cell;
        }
    }

    #[test]
    fn test_straight_line_matches_chebyshev() {
        let arena = Arena::open(8, 8);
        let start = Cell::new(1, 2);
        for goal in [Cell::new(1, 7), Cell::new(6, 2), Cell::new(0, 2)] {
            let path = AStar.shortest_path(start, goal, &arena).unwrap();
            assert_eq!(path.len() as i32, start.chebyshev(goal));
            assert_eq!(path.goal(), Some(goal));
            assert_walkable(&path, start, &arena);
        }
    }

    #[test]
    fn test_path_excludes_start() {
        let arena = Arena::open(5, 5);
        let path = AStar
            .shortest_path(Cell::new(0, 0), Cell::new(0, 2), &arena)
            .unwrap();
        assert_eq!(path.cells().collect::<Vec<_>>(), vec![Cell::new(0, 1), Cell::new(0, 2)]);
        assert_eq!(path.peek_next(), Some(Cell::new(0, 1)));
    }

    #[test]
    fn test_detours_around_obstacle() {
        // Two columns wide, wall at (0,1)
        let arena = Arena::new(Bounds::new(2, 3), [Cell::new(0, 1)]);
        let start = Cell::new(0, 0);
        let path = AStar.shortest_path(start, Cell::new(0, 2), &arena).unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(
            path.cells().collect::<Vec<_>>(),
            vec![Cell::new(1, 0), Cell::new(1, 1), Cell::new(1, 2), Cell::new(0, 2)]
        );
        assert_walkable(&path, start, &arena);
    }

    #[test]
    fn test_enclosed_goal_has_no_path() {
        let goal = Cell::new(3, 3);
        let walls: Vec<_> = goal.neighbors().collect();
        let arena = Arena::new(Bounds::new(7, 7), walls);
        let err = AStar.shortest_path(Cell::new(0, 0), goal, &arena).unwrap_err();
        assert_eq!(err, PathError::NoPath { start: Cell::new(0, 0), goal });
    }

    #[test]
    fn test_rejects_bad_endpoints() {
        let arena = Arena::new(Bounds::new(4, 4), [Cell::new(2, 2)]);
        assert_eq!(
            AStar.shortest_path(Cell::new(0, 0), Cell::new(4, 0), &arena),
            Err(PathError::OutOfBounds(Cell::new(4, 0)))
        );
        assert_eq!(
            AStar.shortest_path(Cell::new(0, 0), Cell::new(2, 2), &arena),
            Err(PathError::Blocked(Cell::new(2, 2)))
        );
    }

    #[test]
    fn test_same_cell_is_empty_path() {
        let arena = Arena::open(3, 3);
        let path = AStar.shortest_path(Cell::new(1, 1), Cell::new(1, 1), &arena).unwrap();
        assert!(path.is_empty());
        assert_eq!(path.peek_next(), None);
    }

    #[test]
    fn test_repeated_searches_agree() {
        let walls = [Cell::new(2, 0), Cell::new(2, 1), Cell::new(2, 2), Cell::new(4, 4), Cell::new(4, 3)];
        let arena = Arena::new(Bounds::new(6, 6), walls);
        let first = AStar.shortest_path(Cell::new(0, 0), Cell::new(5, 5), &arena).unwrap();
        for _ in 0..5 {
            let again = AStar.shortest_path(Cell::new(0, 0), Cell::new(5, 5), &arena).unwrap();
            assert_eq!(again.len(), first.len());
            assert_eq!(again.cost(), first.cost());
        }
        assert_eq!(first.len(), 10);
    }

    #[test]
    fn test_advance_consumes_front() {
        let mut path = Path::new([Cell::new(0, 1), Cell::new(0, 2)]);
        assert_eq!(path.advance(), Some(Cell::new(0, 1)));
        assert_eq!(path.peek_next(), Some(Cell::new(0, 2)));
        assert_eq!(path.len(), 1);
    }
}
