//! Skirmish Core - state-expansion engine for grid tactics
//!
//! Footmen and archers fight on a bounded grid with obstacles. This crate
//! provides what an adversarial tree search needs to drive them:
//! - Grid geometry and obstacle-aware A* pathfinding
//! - Legal-action enumeration and the lazy joint-action cross product
//! - Immutable game states and successor generation
//! - Weighted heuristic evaluation with a path-following bonus
//! - JSON scenario snapshots and engine configuration
//!
//! The search algorithm itself lives with the caller, behind [`SearchState`].

pub mod grid;
pub mod unit;
pub mod pathfinding;
pub mod action;
pub mod game;
pub mod eval;
pub mod config;
pub mod scenario;

// Re-exports for convenient access
pub use grid::{Arena, Bounds, Cell, Direction};
pub use unit::{Side, Unit, UnitId};
pub use pathfinding::{AStar, Path, PathError, Pathfinder};
pub use action::{Action, JointAction, JointActions};
pub use game::{CachedPath, GameContext, GameState, PathCache, SearchState, StateError};
pub use eval::{evaluate, Heuristics, LOSS_VALUE, WIN_VALUE};
pub use config::{EngineConfig, PathBonus, TieBreak};
pub use scenario::{ScenarioError, Snapshot, UnitSpec};
