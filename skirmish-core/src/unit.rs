//! Unit records and sides

use crate::grid::{Cell, Direction};
use serde::{Deserialize, Serialize};

/// Stable unit identity, unique for the whole game and never reused
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Team
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Moves first
    #[default]
    Footmen,
    Archers,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::Footmen => Side::Archers,
            Side::Archers => Side::Footmen,
        }
    }
}

/// A combat unit.
///
/// Plain value: transitions build new units through [`Unit::moved`] and
/// [`Unit::damaged`] instead of mutating a shared record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub position: Cell,
    pub health: i32,
    /// Damage dealt per attack
    pub damage: i32,
    /// Chebyshev distance within which an attack is legal
    pub range: i32,
}

impl Unit {
    pub fn new(id: u32, position: Cell, health: i32, damage: i32, range: i32) -> Self {
        Self {
            id: UnitId(id),
            position,
            health,
            damage,
            range,
        }
    }

    /// Health at or below zero means dead
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Chebyshev range check against another unit's position
    pub fn can_reach(&self, other: &Unit) -> bool {
        self.position.chebyshev(other.position) <= self.range
    }

    /// Copy of this unit one step away
    #[must_use]
    pub fn moved(self, direction: Direction) -> Self {
        Self {
            position: self.position.step(direction),
            ..self
        }
    }

    /// Copy of this unit after taking a hit. Health is not clamped.
    #[must_use]
    pub fn damaged(self, amount: i32) -> Self {
        Self {
            health: self.health - amount,
            ..self
        }
    }
}
