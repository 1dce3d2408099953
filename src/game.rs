use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::{
    board::{OccupancyGrid, OutcomeGrid, ShipCell, ShotCell},
    config::SHIPS,
    ship::arrange_fleet,
};

/// A single-player game a bot can be driven through, one move at a time.
///
/// The runner only talks to games through this trait, so new game types
/// can be scored without touching the runner or the scorer.
pub trait Game: Send {
    /// Snapshot recorded in the move history.
    type State: Clone + Send + Serialize + 'static;

    /// Start a fresh game. The same seed always yields the same game.
    fn from_seed(seed: u64) -> Self
    where
        Self: Sized;

    /// Owned copy of the current state.
    fn state(&self) -> Self::State;

    /// The input handed to the bot for its next move.
    fn next_bot_request(&self) -> String;

    /// Apply the bot's raw output. Returns `false`, leaving the game
    /// untouched, when the move is not legal.
    fn apply_response(&mut self, raw: &str) -> bool;

    fn is_complete(&self) -> bool;

    /// Score in `[0, 1]`, higher is better.
    fn score(&self) -> f64;
}

/// Current status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Complete,
}

/// Serializable snapshot of a battleships game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Occupancy codes: 0 for sea, `n` for the n-th ship of the fleet.
    pub ships: Vec<i8>,
    /// Outcome codes: 0 unknown, -1 miss, 1 hit, 2 sunk.
    pub shots: Vec<i8>,
    pub moves: usize,
    pub status: GameStatus,
}

/// One play-through of single-sided battleships: find and sink the fleet
/// in as few shots as possible.
#[derive(Debug, Clone)]
pub struct BattleshipsGame {
    ships: OccupancyGrid,
    shots: OutcomeGrid,
    moves: usize,
}

impl BattleshipsGame {
    /// Create a game with a fleet laid out by `seed`.
    pub fn new(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut ships = OccupancyGrid::new(ShipCell::Sea);
        arrange_fleet(&mut ships, &SHIPS, &mut rng);
        Self {
            ships,
            shots: OutcomeGrid::new(ShotCell::Unknown),
            moves: 0,
        }
    }

    /// Number of accepted moves.
    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn ships(&self) -> &OccupancyGrid {
        &self.ships
    }

    pub fn shots(&self) -> &OutcomeGrid {
        &self.shots
    }

    pub fn status(&self) -> GameStatus {
        if self.is_complete() {
            GameStatus::Complete
        } else {
            GameStatus::InProgress
        }
    }

    fn occupied_cells(&self) -> usize {
        OccupancyGrid::len() - self.ships.count(ShipCell::Sea)
    }

    /// Reveal the cell at `index`. Returns the new outcome, or `None` if the
    /// index is out of range or already revealed.
    pub fn fire(&mut self, index: usize) -> Option<ShotCell> {
        let (x, y) = OutcomeGrid::index_to_coord(index).ok()?;
        if self.shots.get(x, y).ok()? != ShotCell::Unknown {
            return None;
        }
        let outcome = match self.ships.get(x, y).ok()? {
            ShipCell::Sea => {
                self.shots.put(x, y, ShotCell::Miss).ok()?;
                ShotCell::Miss
            }
            ShipCell::Ship(ship) => {
                self.shots.put(x, y, ShotCell::Hit).ok()?;
                self.sink_if_destroyed(ship)
            }
        };
        self.moves += 1;
        Some(outcome)
    }

    fn sink_if_destroyed(&mut self, ship: usize) -> ShotCell {
        let tag = ShipCell::Ship(ship);
        let cells: Vec<usize> = self
            .ships
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == tag)
            .map(|(i, _)| i)
            .collect();
        let destroyed = cells
            .iter()
            .all(|&i| self.shots.cells()[i] != ShotCell::Unknown);
        if !destroyed {
            return ShotCell::Hit;
        }
        for i in cells {
            if let Ok((x, y)) = OutcomeGrid::index_to_coord(i) {
                let _ = self.shots.put(x, y, ShotCell::Sunk);
            }
        }
        ShotCell::Sunk
    }
}

impl Game for BattleshipsGame {
    type State = GameState;

    fn from_seed(seed: u64) -> Self {
        Self::new(seed)
    }

    fn state(&self) -> GameState {
        GameState {
            ships: self.ships.codes(),
            shots: self.shots.codes(),
            moves: self.moves,
            status: self.status(),
        }
    }

    /// The bot sees the outcome grid only, never the ships.
    fn next_bot_request(&self) -> String {
        self.shots.serialize()
    }

    fn apply_response(&mut self, raw: &str) -> bool {
        if self.is_complete() {
            return false;
        }
        match raw.trim().parse::<usize>() {
            Ok(index) => self.fire(index).is_some(),
            Err(_) => false,
        }
    }

    fn is_complete(&self) -> bool {
        self.shots.count(ShotCell::Sunk) == self.occupied_cells()
    }

    /// 1 when every shot hit a ship, 0 when every sea cell was shot first.
    fn score(&self) -> f64 {
        let occupied = self.occupied_cells();
        let max_misses = OccupancyGrid::len() - occupied;
        if max_misses == 0 {
            return 1.0;
        }
        let misses = self.moves.saturating_sub(occupied).min(max_misses);
        (max_misses - misses) as f64 / max_misses as f64
    }
}
