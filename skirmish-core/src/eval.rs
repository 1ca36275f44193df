//! Position evaluation

use crate::game::GameState;
use crate::unit::{Side, Unit};
use serde::{Deserialize, Serialize};

/// Heuristic weights for position evaluation.
///
/// "Own" and "enemy" are relative to the side the utility is computed for.
/// Enemy weights are expected to be negative.
///
/// The distance term is bounded by `|distance_weight|`, so losing a unit
/// always costs utility and killing one always gains it as long as
/// `|distance_weight|` stays below `own_alive_weight + own_health_weight`
/// and below `-(enemy_alive_weight + enemy_health_weight)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    /// Applied to the mean distance from each own unit to its nearest enemy,
    /// as a fraction of the arena diagonal
    pub distance_weight: f64,
    pub own_health_weight: f64,
    pub own_alive_weight: f64,
    pub enemy_health_weight: f64,
    pub enemy_alive_weight: f64,
    /// Per own unit standing on the next cell of its cached path
    pub path_bonus_weight: f64,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            distance_weight: -1.0,
            own_health_weight: 2.0,
            own_alive_weight: 20.0,
            enemy_health_weight: -5.0,
            enemy_alive_weight: -50.0,
            path_bonus_weight: 10.0,
        }
    }
}

impl Heuristics {
    /// Closes distance fast and trades health for kills
    pub fn aggressive() -> Self {
        Self {
            distance_weight: -3.0,
            own_health_weight: 1.0,
            own_alive_weight: 10.0,
            enemy_health_weight: -8.0,
            enemy_alive_weight: -80.0,
            path_bonus_weight: 15.0,
        }
    }

    /// Keeps units alive, in no hurry to engage
    pub fn cautious() -> Self {
        Self {
            distance_weight: -0.5,
            own_health_weight: 5.0,
            own_alive_weight: 60.0,
            enemy_health_weight: -3.0,
            enemy_alive_weight: -30.0,
            path_bonus_weight: 5.0,
        }
    }
}

/// Terminal value for a win (largest representable)
pub const WIN_VALUE: f64 = f64::MAX;

/// Terminal value for a loss (smallest representable)
pub const LOSS_VALUE: f64 = f64::MIN;

/// Evaluate a state from `side`'s point of view
pub fn evaluate(state: &GameState, side: Side, heuristics: &Heuristics) -> f64 {
    let own = state.roster(side);
    let enemy = state.roster(side.opponent());

    if own.is_empty() {
        return LOSS_VALUE;
    }
    if enemy.is_empty() {
        return WIN_VALUE;
    }

    let diagonal = state.arena().bounds().diagonal();
    let distance: f64 = own
        .iter()
        .filter_map(|unit| nearest_distance(unit, enemy))
        .map(|d| d / diagonal)
        .sum::<f64>()
        / own.len() as f64;
    let own_health: i64 = own.iter().map(|u| i64::from(u.health)).sum();
    let enemy_health: i64 = enemy.iter().map(|u| i64::from(u.health)).sum();

    let mut score = heuristics.distance_weight * distance
        + heuristics.own_health_weight * own_health as f64
        + heuristics.own_alive_weight * own.len() as f64
        + heuristics.enemy_health_weight * enemy_health as f64
        + heuristics.enemy_alive_weight * enemy.len() as f64;

    // Only right after this side's own move, when the hits were counted
    if state.path_tracked_side() == Some(side) && state.to_move() == side.opponent() {
        score += heuristics.path_bonus_weight * state.bonus_hits() as f64;
    }

    score
}

fn nearest_distance(unit: &Unit, enemies: &[Unit]) -> Option<f64> {
    enemies
        .iter()
        .map(|e| unit.position.euclidean(e.position))
        .min_by(f64::total_cmp)
}
