//! Scoring a bot over a batch of independent games.
//!
//! Scores are normalized to `[0, 1]` and higher is better, both for the
//! tournament average and for best-score tracking and ranking.

use std::time::Instant;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::bot::Bot;
use crate::game::Game;
use crate::runner::{BotFailure, GameOutcome, GameRunner};

/// A tournament that ran every game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentScore {
    /// Mean of the per-game scores.
    pub score: f64,
    /// Mean wall-clock seconds per game.
    pub avg_time: f64,
    pub scores: Vec<f64>,
}

/// A tournament stopped at its first failed game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringAborted {
    /// Games that finished before the failure. Their scores are discarded.
    pub games_completed: usize,
    /// Zero-based index of the failed game.
    pub failed_game: usize,
    /// Seed of the failed game, for replay.
    pub game_seed: u64,
    pub failure: BotFailure,
}

impl core::fmt::Display for ScoringAborted {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "scoring aborted in game {} (seed {}): {}",
            self.failed_game + 1,
            self.game_seed,
            self.failure.kind.error_type()
        )
    }
}

impl std::error::Error for ScoringAborted {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TournamentResult {
    Completed(TournamentScore),
    Aborted(ScoringAborted),
}

impl TournamentResult {
    pub fn into_result(self) -> Result<TournamentScore, ScoringAborted> {
        match self {
            TournamentResult::Completed(s) => Ok(s),
            TournamentResult::Aborted(a) => Err(a),
        }
    }
}

/// Whether `candidate` beats the previous best. Higher is better; the first
/// score always counts as a best.
pub fn is_improvement(previous_best: Option<f64>, candidate: f64) -> bool {
    match previous_best {
        Some(best) => candidate > best,
        None => true,
    }
}

/// Runs a fixed number of games against one bot.
#[derive(Debug, Clone)]
pub struct Tournament {
    games: usize,
    base_seed: Option<u64>,
}

impl Tournament {
    /// A tournament of `games` games. At least one game is always played.
    pub fn new(games: usize) -> Self {
        Self {
            games: games.max(1),
            base_seed: None,
        }
    }

    /// Make the tournament reproducible: game `i` uses `seed + i`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.base_seed = Some(seed);
        self
    }

    pub async fn run<G: Game>(&self, bot: &dyn Bot) -> TournamentResult {
        let runner = GameRunner::<G>::new();
        let mut scores = Vec::with_capacity(self.games);
        let mut elapsed = 0.0;

        for i in 0..self.games {
            let seed = self.base_seed.map(|s| s.wrapping_add(i as u64));
            let start = Instant::now();
            let result = runner.play(bot, seed).await;
            let game_seed = result.seed;
            match result.outcome {
                GameOutcome::Success { score, .. } => {
                    elapsed += start.elapsed().as_secs_f64();
                    scores.push(score);
                    info!("played {}/{}", i + 1, self.games);
                }
                GameOutcome::Failure(failure) => {
                    let aborted = ScoringAborted {
                        games_completed: i,
                        failed_game: i,
                        game_seed,
                        failure,
                    };
                    warn!("{}", aborted);
                    return TournamentResult::Aborted(aborted);
                }
            }
        }

        let n = self.games as f64;
        TournamentResult::Completed(TournamentScore {
            score: scores.iter().sum::<f64>() / n,
            avg_time: elapsed / n,
            scores,
        })
    }
}
