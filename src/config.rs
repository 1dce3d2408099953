use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::ship::ShipType;

pub const BOARD_SIZE: usize = 10;
pub const NUM_CELLS: usize = BOARD_SIZE * BOARD_SIZE;
pub const NUM_SHIPS: usize = 5;
pub const SHIPS: [ShipType; NUM_SHIPS] = [
    ShipType::new("Carrier", 5),
    ShipType::new("Battleship", 4),
    ShipType::new("Cruiser", 3),
    ShipType::new("Submarine", 3),
    ShipType::new("Destroyer", 2),
];

/// Total number of ship segments used in the standard configuration.
pub const TOTAL_SHIP_CELLS: usize = 5 + 4 + 3 + 3 + 2;

/// Runtime settings for the runner, scorer and queues.
///
/// Every field has a default, so a settings file only needs to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding bot executables, one file per bot id.
    pub bot_dir: PathBuf,
    /// Wall-clock limit for a single bot invocation.
    pub move_timeout_secs: u64,
    pub games_per_tournament: usize,
    pub interactive_capacity: usize,
    pub scoring_capacity: usize,
    /// How long an interactive game result waits to be collected.
    pub result_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_dir: PathBuf::from("bots"),
            move_timeout_secs: 10,
            games_per_tournament: 10,
            interactive_capacity: 100,
            scoring_capacity: 500,
            result_ttl_secs: 3600,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings = serde_json::from_str(&raw)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        Ok(settings)
    }

    pub fn move_timeout(&self) -> Duration {
        Duration::from_secs(self.move_timeout_secs)
    }

    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_secs)
    }
}
