//! Unit actions and joint actions

use crate::grid::Direction;
use crate::unit::UnitId;
use serde::{Deserialize, Serialize};

/// What one unit does during a ply
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Move { direction: Direction },
    Attack { target: UnitId },
    /// Stand still. Only generated when a unit has nothing else to do.
    Hold,
}

/// One action per living unit of the side to move, in roster order
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JointAction {
    entries: Vec<(UnitId, Action)>,
}

impl JointAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the action for a unit, returning the one it replaces
    pub fn insert(&mut self, unit: UnitId, action: Action) -> Option<Action> {
        match self.entries.iter_mut().find(|(id, _)| *id == unit) {
            Some((_, slot)) => Some(std::mem::replace(slot, action)),
            None => {
                self.entries.push((unit, action));
                None
            }
        }
    }

    /// Builder form of [`JointAction::insert`]
    #[must_use]
    pub fn with(mut self, unit: UnitId, action: Action) -> Self {
        self.insert(unit, action);
        self
    }

    pub fn get(&self, unit: UnitId) -> Option<Action> {
        self.entries
            .iter()
            .find(|(id, _)| *id == unit)
            .map(|&(_, action)| action)
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitId, Action)> + '_ {
        self.entries.iter().copied()
    }

    pub fn units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.entries.iter().map(|&(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(UnitId, Action)> for JointAction {
    fn from_iter<I: IntoIterator<Item = (UnitId, Action)>>(iter: I) -> Self {
        let mut joint = JointAction::new();
        for (unit, action) in iter {
            joint.insert(unit, action);
        }
        joint
    }
}

// ============================================================================
// CROSS PRODUCT
// ============================================================================

/// Candidate actions of every acting unit, in roster order
pub type ActionTable = Vec<(UnitId, Vec<Action>)>;

/// Lazy Cartesian product over per-unit candidate lists.
///
/// Walks the combinations like an odometer, last unit fastest. Yields
/// exactly `product(|candidates|)` joint actions, or a single empty joint
/// action when no unit acts. `size_hint` is exact while the product fits in
/// a `usize` and unbounded above otherwise.
#[derive(Clone, Debug)]
pub struct JointActions {
    table: ActionTable,
    cursor: Vec<usize>,
    /// None once the product overflowed
    remaining: Option<usize>,
    done: bool,
}

impl JointActions {
    pub fn new(table: ActionTable) -> Self {
        let remaining = count_combinations(&table);
        let cursor = vec![0; table.len()];
        Self {
            table,
            cursor,
            remaining,
            done: remaining == Some(0),
        }
    }

    pub fn table(&self) -> &ActionTable {
        &self.table
    }

    /// Advance the cursor. Returns false once every combination was seen.
    fn advance(&mut self) -> bool {
        for i in (0..self.cursor.len()).rev() {
            self.cursor[i] += 1;
            if self.cursor[i] < self.table[i].1.len() {
                return true;
            }
            self.cursor[i] = 0;
        }
        false
    }
}

impl Iterator for JointActions {
    type Item = JointAction;

    fn next(&mut self) -> Option<JointAction> {
        if self.done {
            return None;
        }

        let joint = JointAction {
            entries: self
                .table
                .iter()
                .zip(&self.cursor)
                .map(|((unit, actions), &i)| (*unit, actions[i]))
                .collect(),
        };

        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
        if !self.advance() {
            self.done = true;
        }
        Some(joint)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            _ if self.done => (0, Some(0)),
            Some(remaining) => (remaining, Some(remaining)),
            None => (usize::MAX, None),
        }
    }
}

/// Size of the product, or None if it does not fit in a `usize`
pub fn count_combinations(table: &ActionTable) -> Option<usize> {
    table
        .iter()
        .try_fold(1usize, |acc, (_, actions)| acc.checked_mul(actions.len()))
}
