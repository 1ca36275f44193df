//! Scenario snapshots - the starting position handed over by the host

use crate::config::EngineConfig;
use crate::game::{GameContext, GameState};
use crate::grid::{Arena, Bounds, Cell};
use crate::pathfinding::Pathfinder;
use crate::unit::{Side, Unit, UnitId};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// One unit as the host reports it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub health: i32,
    pub damage: i32,
    pub range: i32,
}

impl UnitSpec {
    pub fn to_unit(self) -> Unit {
        Unit::new(self.id, Cell::new(self.x, self.y), self.health, self.damage, self.range)
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

impl From<&Unit> for UnitSpec {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id.0,
            x: unit.position.x,
            y: unit.position.y,
            health: unit.health,
            damage: unit.damage,
            range: unit.range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    #[error("arena must be at least 1x1, got {x_extent}x{y_extent}")]
    EmptyArena { x_extent: i32, y_extent: i32 },

    #[error("obstacle {0} lies outside the arena")]
    ObstacleOutOfBounds(Cell),

    #[error("unit id {0} is used more than once")]
    DuplicateId(UnitId),

    #[error("unit {unit} at {cell} lies outside the arena")]
    OutOfBounds { unit: UnitId, cell: Cell },

    #[error("unit {unit} stands on obstacle {cell}")]
    OnObstacle { unit: UnitId, cell: Cell },

    #[error("unit {0} has no health left")]
    DeadUnit(UnitId),

    #[error("unit {unit} has negative {stat}")]
    NegativeStat { unit: UnitId, stat: &'static str },
}

/// Serializable picture of a skirmish: arena, obstacles, both rosters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub x_extent: i32,
    pub y_extent: i32,
    #[serde(default)]
    pub obstacles: Vec<Cell>,
    pub footmen: Vec<UnitSpec>,
    pub archers: Vec<UnitSpec>,
    /// Side to act first; footmen unless stated
    #[serde(default)]
    pub to_move: Side,
}

impl Snapshot {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x_extent, self.y_extent)
    }

    pub fn arena(&self) -> Arena {
        Arena::new(self.bounds(), self.obstacles.iter().copied())
    }

    pub fn roster(&self, side: Side) -> &[UnitSpec] {
        match side {
            Side::Footmen => &self.footmen,
            Side::Archers => &self.archers,
        }
    }

    /// Check the snapshot describes a playable position
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.x_extent <= 0 || self.y_extent <= 0 {
            return Err(ScenarioError::EmptyArena {
                x_extent: self.x_extent,
                y_extent: self.y_extent,
            });
        }

        let bounds = self.bounds();
        if let Some(&cell) = self.obstacles.iter().find(|&&c| !bounds.contains(c)) {
            return Err(ScenarioError::ObstacleOutOfBounds(cell));
        }
        let obstacles: FxHashSet<Cell> = self.obstacles.iter().copied().collect();

        let mut seen = FxHashSet::default();
        for entry in self.footmen.iter().chain(&self.archers) {
            let unit = UnitId(entry.id);
            let cell = entry.cell();
            if !seen.insert(unit) {
                return Err(ScenarioError::DuplicateId(unit));
            }
            if !bounds.contains(cell) {
                return Err(ScenarioError::OutOfBounds { unit, cell });
            }
            if obstacles.contains(&cell) {
                return Err(ScenarioError::OnObstacle { unit, cell });
            }
            if entry.health <= 0 {
                return Err(ScenarioError::DeadUnit(unit));
            }
            if entry.damage < 0 {
                return Err(ScenarioError::NegativeStat { unit, stat: "damage" });
            }
            if entry.range < 0 {
                return Err(ScenarioError::NegativeStat { unit, stat: "range" });
            }
        }
        Ok(())
    }

    /// Root search state using A*
    pub fn to_game_state(&self, config: EngineConfig) -> Result<GameState, ScenarioError> {
        self.validate()?;
        let context = GameContext::new(self.arena(), config);
        Ok(self.build(Arc::new(context)))
    }

    /// Root search state with a caller-supplied pathfinder
    pub fn to_game_state_with(
        &self,
        config: EngineConfig,
        pathfinder: impl Pathfinder + 'static,
    ) -> Result<GameState, ScenarioError> {
        self.validate()?;
        let context = GameContext::with_pathfinder(self.arena(), config, pathfinder);
        Ok(self.build(Arc::new(context)))
    }

    fn build(&self, context: Arc<GameContext>) -> GameState {
        let units = |entries: &[UnitSpec]| -> Vec<Unit> { entries.iter().map(|s| s.to_unit()).collect() };
        GameState::new(context, units(&self.footmen), units(&self.archers), self.to_move)
    }

    /// Capture a search state, e.g. to replay a position later
    pub fn from_state(state: &GameState) -> Self {
        let bounds = state.arena().bounds();
        let mut obstacles: Vec<Cell> = state.arena().obstacles().collect();
        obstacles.sort();
        Self {
            x_extent: bounds.x_extent,
            y_extent: bounds.y_extent,
            obstacles,
            footmen: state.footmen().iter().map(UnitSpec::from).collect(),
            archers: state.archers().iter().map(UnitSpec::from).collect(),
            to_move: state.to_move(),
        }
    }

    /// Parse and validate JSON
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    // ========================================================================
    // RANDOM SCENARIOS
    // ========================================================================

    /// Random valid skirmish on an `x_extent` by `y_extent` arena.
    ///
    /// Units and obstacles take distinct cells; counts are cut down when the
    /// arena is too small to hold them all. Footmen are sturdy melee units,
    /// archers are frail with reach.
    pub fn random_skirmish<R: Rng>(
        rng: &mut R,
        x_extent: i32,
        y_extent: i32,
        footmen: usize,
        archers: usize,
        obstacles: usize,
    ) -> Self {
        let x_extent = x_extent.max(1);
        let y_extent = y_extent.max(1);

        let mut cells: Vec<Cell> = (0..y_extent)
            .flat_map(|y| (0..x_extent).map(move |x| Cell::new(x, y)))
            .collect();
        cells.shuffle(rng);
        let mut free = cells.into_iter();

        let footmen: Vec<UnitSpec> = free
            .by_ref()
            .take(footmen)
            .zip(1u32..)
            .map(|(cell, id)| UnitSpec {
                id,
                x: cell.x,
                y: cell.y,
                health: rng.gen_range(10..=16),
                damage: rng.gen_range(2..=4),
                range: 1,
            })
            .collect();

        let first_archer = footmen.len() as u32 + 1;
        let archers: Vec<UnitSpec> = free
            .by_ref()
            .take(archers)
            .zip(first_archer..)
            .map(|(cell, id)| UnitSpec {
                id,
                x: cell.x,
                y: cell.y,
                health: rng.gen_range(6..=10),
                damage: rng.gen_range(1..=3),
                range: rng.gen_range(2..=4),
            })
            .collect();

        let mut obstacles: Vec<Cell> = free.take(obstacles).collect();
        obstacles.sort();

        Self {
            x_extent,
            y_extent,
            obstacles,
            footmen,
            archers,
            to_move: Side::Footmen,
        }
    }

    /// [`Snapshot::random_skirmish`] from a fixed seed
    pub fn seeded(
        seed: u64,
        x_extent: i32,
        y_extent: i32,
        footmen: usize,
        archers: usize,
        obstacles: usize,
    ) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::random_skirmish(&mut rng, x_extent, y_extent, footmen, archers, obstacles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, x: i32, y: i32) -> UnitSpec {
        UnitSpec { id, x, y, health: 10, damage: 2, range: 1 }
    }

    fn duel() -> Snapshot {
        Snapshot {
            x_extent: 5,
            y_extent: 5,
            obstacles: vec![Cell::new(2, 2)],
            footmen: vec![entry(1, 0, 0)],
            archers: vec![UnitSpec { range: 3, damage: 1, ..entry(2, 0, 3) }],
            to_move: Side::Footmen,
        }
    }

    #[test]
    fn test_parse_host_format() {
        let json = r#"{
            "x_extent": 5, "y_extent": 5,
            "obstacles": [{ "x": 2, "y": 2 }],
            "footmen": [{ "id": 1, "x": 0, "y": 0, "health": 10, "damage": 2, "range": 1 }],
            "archers": [{ "id": 2, "x": 0, "y": 3, "health": 10, "damage": 1, "range": 3 }]
        }"#;
        assert_eq!(Snapshot::from_json(json).unwrap(), duel());
    }

    #[test]
    fn test_validation_errors() {
        let mut s = duel();
        s.archers[0].id = 1;
        assert_eq!(s.validate(), Err(ScenarioError::DuplicateId(UnitId(1))));

        let mut s = duel();
        s.footmen[0].x = 5;
        assert!(matches!(s.validate(), Err(ScenarioError::OutOfBounds { .. })));

        let mut s = duel();
        s.footmen[0].x = 2;
        s.footmen[0].y = 2;
        assert!(matches!(s.validate(), Err(ScenarioError::OnObstacle { .. })));

        let mut s = duel();
        s.archers[0].health = 0;
        assert_eq!(s.validate(), Err(ScenarioError::DeadUnit(UnitId(2))));

        let mut s = duel();
        s.archers[0].range = -1;
        assert_eq!(
            s.validate(),
            Err(ScenarioError::NegativeStat { unit: UnitId(2), stat: "range" })
        );

        let mut s = duel();
        s.obstacles.push(Cell::new(-1, 0));
        assert_eq!(s.validate(), Err(ScenarioError::ObstacleOutOfBounds(Cell::new(-1, 0))));

        let mut s = duel();
        s.y_extent = 0;
        assert!(matches!(s.validate(), Err(ScenarioError::EmptyArena { .. })));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(Snapshot::from_json("{ \"x_extent\": 3 }").is_err());
        let dead = r#"{ "x_extent": 2, "y_extent": 2, "footmen": [{ "id": 1, "x": 0, "y": 0, "health": -3, "damage": 1, "range": 1 }], "archers": [] }"#;
        assert!(Snapshot::from_json(dead).is_err());
    }

    #[test]
    fn test_to_game_state_and_back() {
        let snapshot = duel();
        let state = snapshot.to_game_state(EngineConfig::default()).unwrap();
        assert_eq!(state.footmen()[0].position, Cell::new(0, 0));
        assert_eq!(state.archers()[0].range, 3);
        assert!(state.arena().is_obstacle(Cell::new(2, 2)));
        assert_eq!(Snapshot::from_state(&state), snapshot);
    }

    #[test]
    fn test_seeded_is_reproducible_and_valid() {
        let a = Snapshot::seeded(7, 8, 6, 3, 2, 5);
        let b = Snapshot::seeded(7, 8, 6, 3, 2, 5);
        assert_eq!(a, b);
        assert_eq!(a.footmen.len(), 3);
        assert_eq!(a.archers.len(), 2);
        assert_eq!(a.obstacles.len(), 5);
        a.validate().unwrap();
        assert_ne!(a, Snapshot::seeded(8, 8, 6, 3, 2, 5));
    }

    #[test]
    fn test_random_skirmish_fits_small_arena() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let s = Snapshot::random_skirmish(&mut rng, 2, 2, 3, 3, 3);
        assert_eq!(s.footmen.len() + s.archers.len() + s.obstacles.len(), 4);
        s.validate().unwrap();
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("skirmish-scenario-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("duel.json");

        duel().save(&path).unwrap();
        assert_eq!(Snapshot::load(&path).unwrap(), duel());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
