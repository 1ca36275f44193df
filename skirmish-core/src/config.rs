//! Engine configuration

use crate::eval::Heuristics;
use crate::unit::Side;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How to choose between equally distant enemies
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieBreak {
    /// Earliest in the enemy roster wins
    #[default]
    FirstInRoster,
    /// Smallest unit id wins
    LowestId,
}

/// Path-following bonus policy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathBonus {
    pub enabled: bool,
    pub tie_break: TieBreak,
}

impl Default for PathBonus {
    fn default() -> Self {
        Self {
            enabled: true,
            tie_break: TieBreak::FirstInRoster,
        }
    }
}

/// Configuration shared by every state of one search
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Side utility is reported for; also the side whose paths are tracked
    pub perspective: Side,
    /// Evaluation weights
    pub heuristics: Heuristics,
    pub path_bonus: PathBonus,
}

impl EngineConfig {
    /// Set custom heuristics
    pub fn with_heuristics(mut self, heuristics: Heuristics) -> Self {
        self.heuristics = heuristics;
        self
    }

    pub fn with_perspective(mut self, side: Side) -> Self {
        self.perspective = side;
        self
    }

    /// Disable path tracking and its bonus term
    pub fn without_path_bonus(mut self) -> Self {
        self.path_bonus.enabled = false;
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.path_bonus.tie_break = tie_break;
        self
    }

    /// Side whose paths are cached, if any
    pub fn tracked_side(&self) -> Option<Side> {
        self.path_bonus.enabled.then_some(self.perspective)
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.perspective, Side::Footmen);
        assert_eq!(config.tracked_side(), Some(Side::Footmen));
        assert_eq!(config.path_bonus.tie_break, TieBreak::FirstInRoster);
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_perspective(Side::Archers)
            .with_tie_break(TieBreak::LowestId)
            .with_heuristics(Heuristics::cautious());
        assert_eq!(config.tracked_side(), Some(Side::Archers));
        assert_eq!(config.heuristics, Heuristics::cautious());
        assert_eq!(config.without_path_bonus().tracked_side(), None);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(
            r#"{ "perspective": "Archers", "heuristics": { "distance_weight": -2.5 } }"#,
        )
        .unwrap();
        assert_eq!(config.perspective, Side::Archers);
        assert_eq!(config.heuristics.distance_weight, -2.5);
        assert_eq!(config.heuristics.own_alive_weight, Heuristics::default().own_alive_weight);
        assert!(config.path_bonus.enabled);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("skirmish-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("engine.json");

        let config = EngineConfig::default().with_tie_break(TieBreak::LowestId);
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
