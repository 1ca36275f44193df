//! Game state, legal actions, and successor generation

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::action::{Action, ActionTable, JointAction, JointActions};
use crate::config::{EngineConfig, TieBreak};
use crate::eval::evaluate;
use crate::grid::{Arena, Cell, Direction};
use crate::pathfinding::{AStar, Path, Pathfinder};
use crate::unit::{Side, Unit, UnitId};

// ============================================================================
// SEARCH CONTRACT
// ============================================================================

/// What a game-tree search needs from a node
pub trait SearchState: Sized {
    type Action;

    fn is_terminal(&self) -> bool;

    /// Desirability of this node for the maximizing side
    fn utility(&self) -> f64;

    /// Every successor with the action that produces it
    fn children(&self) -> Vec<(Self::Action, Self)>;
}

// ============================================================================
// ERRORS
// ============================================================================

/// Rejected joint actions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("unit {0} is not on the board")]
    UnknownUnit(UnitId),

    #[error("unit {unit} does not belong to {side:?}, the side to move")]
    WrongSide { unit: UnitId, side: Side },

    #[error("unit {0} has no action")]
    MissingAction(UnitId),

    #[error("{action:?} is not legal for unit {unit}")]
    IllegalAction { unit: UnitId, action: Action },

    #[error("the game is over")]
    Terminal,
}

// ============================================================================
// SHARED CONTEXT
// ============================================================================

/// Everything that stays fixed for one search: the arena, the configuration,
/// and the pathfinder. Shared between states through an `Arc`.
pub struct GameContext {
    arena: Arena,
    config: EngineConfig,
    pathfinder: Box<dyn Pathfinder>,
}

impl GameContext {
    /// Context using the A* pathfinder
    pub fn new(arena: Arena, config: EngineConfig) -> Self {
        Self::with_pathfinder(arena, config, AStar)
    }

    pub fn with_pathfinder(
        arena: Arena,
        config: EngineConfig,
        pathfinder: impl Pathfinder + 'static,
    ) -> Self {
        Self {
            arena,
            config,
            pathfinder: Box::new(pathfinder),
        }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pathfinder(&self) -> &dyn Pathfinder {
        self.pathfinder.as_ref()
    }
}

impl fmt::Debug for GameContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameContext")
            .field("arena", &self.arena)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// PATH CACHE
// ============================================================================

/// A unit's remembered route to its nearest enemy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedPath {
    /// Enemy the path leads to
    pub target: UnitId,
    /// Where that enemy stood when the path was computed
    pub goal: Cell,
    /// Cell the path starts from
    pub from: Cell,
    pub path: Path,
}

pub type PathCache = FxHashMap<UnitId, CachedPath>;

/// Nearest enemy by straight-line distance
pub fn nearest_enemy<'a>(unit: &Unit, enemies: &'a [Unit], tie_break: TieBreak) -> Option<&'a Unit> {
    let mut best: Option<(&Unit, i64)> = None;
    for enemy in enemies {
        let d = unit.position.distance_squared(enemy.position);
        let better = match best {
            None => true,
            Some((current, best_d)) => {
                d < best_d
                    || (d == best_d
                        && tie_break == TieBreak::LowestId
                        && enemy.id < current.id)
            }
        };
        if better {
            best = Some((enemy, d));
        }
    }
    best.map(|(enemy, _)| enemy)
}

// ============================================================================
// GAME STATE
// ============================================================================

/// A node of the game tree.
///
/// Immutable once built: successors are new values. Rosters only hold
/// living units; a unit whose health drops to zero or below is removed by
/// the transition that killed it.
#[derive(Clone, Debug)]
pub struct GameState {
    context: Arc<GameContext>,
    footmen: Vec<Unit>,
    archers: Vec<Unit>,
    to_move: Side,
    /// Paths of the tracked side, carried across the opponent's plies
    path_cache: Arc<PathCache>,
    /// Tracked units that stepped onto their cached path on the last ply
    bonus_hits: usize,
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Root state. Dead units are dropped and, when path tracking is on,
    /// the tracked side's paths are computed.
    pub fn new(
        context: Arc<GameContext>,
        mut footmen: Vec<Unit>,
        mut archers: Vec<Unit>,
        to_move: Side,
    ) -> Self {
        footmen.retain(Unit::is_alive);
        archers.retain(Unit::is_alive);

        let mut state = Self {
            context,
            footmen,
            archers,
            to_move,
            path_cache: Arc::default(),
            bonus_hits: 0,
        };
        if let Some(side) = state.path_tracked_side() {
            let (cache, _) = state.track_paths(side, &PathCache::default());
            state.path_cache = Arc::new(cache);
        }
        state
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn context(&self) -> &Arc<GameContext> {
        &self.context
    }

    pub fn arena(&self) -> &Arena {
        self.context.arena()
    }

    pub fn config(&self) -> &EngineConfig {
        self.context.config()
    }

    /// Side whose units act next
    pub fn to_move(&self) -> Side {
        self.to_move
    }

    /// Living units of a side, in roster order
    pub fn roster(&self, side: Side) -> &[Unit] {
        match side {
            Side::Footmen => &self.footmen,
            Side::Archers => &self.archers,
        }
    }

    pub fn footmen(&self) -> &[Unit] {
        &self.footmen
    }

    pub fn archers(&self) -> &[Unit] {
        &self.archers
    }

    /// Look a unit up by id on either side
    pub fn unit(&self, id: UnitId) -> Option<(Side, &Unit)> {
        [Side::Footmen, Side::Archers].into_iter().find_map(|side| {
            self.roster(side)
                .iter()
                .find(|u| u.id == id)
                .map(|u| (side, u))
        })
    }

    pub fn path_cache(&self) -> &PathCache {
        &self.path_cache
    }

    pub fn bonus_hits(&self) -> usize {
        self.bonus_hits
    }

    pub fn path_tracked_side(&self) -> Option<Side> {
        self.config().tracked_side()
    }

    /// True iff either roster is empty
    pub fn is_terminal(&self) -> bool {
        self.footmen.is_empty() || self.archers.is_empty()
    }

    /// Side with survivors once the game is over
    pub fn winner(&self) -> Option<Side> {
        match (self.footmen.is_empty(), self.archers.is_empty()) {
            (false, true) => Some(Side::Footmen),
            (true, false) => Some(Side::Archers),
            _ => None,
        }
    }

    // ========================================================================
    // EVALUATION
    // ========================================================================

    /// Utility from the configured perspective side
    pub fn utility(&self) -> f64 {
        self.utility_for(self.config().perspective)
    }

    pub fn utility_for(&self, side: Side) -> f64 {
        evaluate(self, side, &self.config().heuristics)
    }

    // ========================================================================
    // ACTION GENERATION
    // ========================================================================

    fn unit_actions(&self, unit: &Unit, enemies: &[Unit]) -> Vec<Action> {
        let arena = self.arena();
        let mut actions: Vec<Action> = Direction::ALL
            .into_iter()
            .filter(|&d| arena.is_passable(unit.position.step(d)))
            .map(|direction| Action::Move { direction })
            .collect();

        actions.extend(
            enemies
                .iter()
                .filter(|enemy| unit.can_reach(enemy))
                .map(|enemy| Action::Attack { target: enemy.id }),
        );

        // Boxed in with nobody in range
        if actions.is_empty() {
            actions.push(Action::Hold);
        }
        actions
    }

    /// Legal actions of one unit of the side to move
    pub fn legal_actions(&self, id: UnitId) -> Result<Vec<Action>, StateError> {
        match self.unit(id) {
            None => Err(StateError::UnknownUnit(id)),
            Some((side, _)) if side != self.to_move => Err(StateError::WrongSide {
                unit: id,
                side: self.to_move,
            }),
            Some((side, unit)) => Ok(self.unit_actions(unit, self.roster(side.opponent()))),
        }
    }

    /// Candidate actions of every unit of the side to move
    pub fn action_table(&self) -> ActionTable {
        let enemies = self.roster(self.to_move.opponent());
        self.roster(self.to_move)
            .iter()
            .map(|unit| (unit.id, self.unit_actions(unit, enemies)))
            .collect()
    }

    /// Lazy stream of every joint action of the side to move
    pub fn joint_actions(&self) -> JointActions {
        JointActions::new(self.action_table())
    }

    // ========================================================================
    // SUCCESSORS
    // ========================================================================

    /// Lazy successor stream; stops early when the caller does.
    /// Empty for terminal states.
    pub fn children_iter(&self) -> impl Iterator<Item = (JointAction, GameState)> + '_ {
        let joints = (!self.is_terminal()).then(|| self.joint_actions());
        joints.into_iter().flatten().map(move |joint| {
            let child = self.transition(&joint);
            (joint, child)
        })
    }

    /// Every successor, fully materialized
    pub fn children(&self) -> Vec<(JointAction, GameState)> {
        let children: Vec<_> = self.children_iter().collect();
        tracing::debug!(
            side = ?self.to_move,
            units = self.roster(self.to_move).len(),
            branching = children.len(),
            "expanded state"
        );
        children
    }

    /// [`GameState::children`] with transitions spread over the rayon pool.
    /// Same order as the sequential version.
    #[cfg(feature = "parallel")]
    pub fn par_children(&self) -> Vec<(JointAction, GameState)> {
        use rayon::prelude::*;

        if self.is_terminal() {
            return Vec::new();
        }
        let joints: Vec<JointAction> = self.joint_actions().collect();
        joints
            .into_par_iter()
            .map(|joint| {
                let child = self.transition(&joint);
                (joint, child)
            })
            .collect()
    }

    /// Apply a joint action built outside the engine, checking it first
    pub fn apply(&self, joint: &JointAction) -> Result<GameState, StateError> {
        if self.is_terminal() {
            return Err(StateError::Terminal);
        }

        for (id, action) in joint.iter() {
            let legal = self.legal_actions(id)?;
            if !legal.contains(&action) {
                return Err(StateError::IllegalAction { unit: id, action });
            }
        }
        if let Some(unit) = self
            .roster(self.to_move)
            .iter()
            .find(|u| joint.get(u.id).is_none())
        {
            return Err(StateError::MissingAction(unit.id));
        }

        Ok(self.transition(joint))
    }

    /// Successor for a joint action whose ids came from this state
    fn transition(&self, joint: &JointAction) -> GameState {
        let mover = self.to_move;
        let mut own = self.roster(mover).to_vec();
        let mut enemies = self.roster(mover.opponent()).to_vec();

        for (id, action) in joint.iter() {
            let Some(actor) = own.iter().position(|u| u.id == id) else {
                debug_assert!(false, "unit {id} is not on the moving side");
                continue;
            };
            match action {
                Action::Move { direction } => {
                    own[actor] = own[actor].moved(direction);
                }
                Action::Attack { target } => {
                    let damage = own[actor].damage;
                    match enemies.iter_mut().find(|u| u.id == target) {
                        Some(victim) => *victim = victim.damaged(damage),
                        None => debug_assert!(false, "attack target {target} is not on the board"),
                    }
                }
                Action::Hold => {}
            }
        }

        enemies.retain(Unit::is_alive);

        let (footmen, archers) = match mover {
            Side::Footmen => (own, enemies),
            Side::Archers => (enemies, own),
        };

        let mut child = GameState {
            context: Arc::clone(&self.context),
            footmen,
            archers,
            to_move: mover.opponent(),
            path_cache: Arc::clone(&self.path_cache),
            bonus_hits: 0,
        };

        if self.path_tracked_side() == Some(mover) {
            let (cache, hits) = child.track_paths(mover, &self.path_cache);
            child.path_cache = Arc::new(cache);
            child.bonus_hits = hits;
        }
        child
    }

    /// Refresh `side`'s paths against this state's positions.
    ///
    /// Returns the new cache and the number of units standing on the next
    /// cell of their previous path. A path is searched again only when the
    /// unit left it or its target moved or changed.
    fn track_paths(&self, side: Side, previous: &PathCache) -> (PathCache, usize) {
        let enemies = self.roster(side.opponent());
        let tie_break = self.config().path_bonus.tie_break;
        let mut cache = PathCache::default();
        let mut hits = 0;

        for unit in self.roster(side) {
            let prior = previous.get(&unit.id);
            let on_path = prior.and_then(|c| c.path.peek_next()) == Some(unit.position);
            if on_path {
                hits += 1;
            }

            let Some(target) = nearest_enemy(unit, enemies, tie_break) else {
                continue;
            };

            let reusable = prior.filter(|c| c.target == target.id && c.goal == target.position);
            let entry = match reusable {
                Some(c) if c.from == unit.position => Some(c.clone()),
                Some(c) if on_path => {
                    let mut c = c.clone();
                    c.path.advance();
                    c.from = unit.position;
                    Some(c)
                }
                _ => match self
                    .context
                    .pathfinder()
                    .shortest_path(unit.position, target.position, self.arena())
                {
                    Ok(path) => Some(CachedPath {
                        target: target.id,
                        goal: target.position,
                        from: unit.position,
                        path,
                    }),
                    Err(err) => {
                        tracing::debug!(unit = %unit.id, %err, "no path bonus for unit");
                        None
                    }
                },
            };

            if let Some(entry) = entry {
                cache.insert(unit.id, entry);
            }
        }

        (cache, hits)
    }
}

/// Equal positions compare equal regardless of the context they live in
impl PartialEq for GameState {
    fn eq(&self, other: &Self) -> bool {
        self.to_move == other.to_move
            && self.footmen == other.footmen
            && self.archers == other.archers
            && self.bonus_hits == other.bonus_hits
            && self.path_cache == other.path_cache
    }
}

impl SearchState for GameState {
    type Action = JointAction;

    fn is_terminal(&self) -> bool {
        GameState::is_terminal(self)
    }

    fn utility(&self) -> f64 {
        GameState::utility(self)
    }

    fn children(&self) -> Vec<(JointAction, GameState)> {
        GameState::children(self)
    }
}

// ============================================================================
// TESTS
// ============================================================================
