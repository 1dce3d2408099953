//! Drives one game to completion against a bot.

use std::marker::PhantomData;

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bot::Bot;
use crate::common::FailureKind;
use crate::game::Game;

/// One step of a play-through. The first entry of every history has no
/// request or response and holds the initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord<S> {
    pub request: Option<String>,
    pub response: Option<String>,
    pub state: S,
}

/// Why and where a bot was stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotFailure {
    #[serde(rename = "error_type")]
    pub kind: FailureKind,
    #[serde(rename = "error_message")]
    pub message: String,
    /// The request the bot failed to answer, i.e. the game state it saw.
    pub bot_request: Option<String>,
    /// Raw output, when the bot produced any.
    pub bot_response: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GameOutcome {
    Success { score: f64, moves: usize },
    Failure(BotFailure),
}

/// Everything known about a finished play-through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult<S> {
    pub seed: u64,
    pub history: Vec<MoveRecord<S>>,
    pub outcome: GameOutcome,
}

impl<S> GameResult<S> {
    pub fn success(&self) -> bool {
        matches!(self.outcome, GameOutcome::Success { .. })
    }

    pub fn score(&self) -> Option<f64> {
        match self.outcome {
            GameOutcome::Success { score, .. } => Some(score),
            GameOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&BotFailure> {
        match &self.outcome {
            GameOutcome::Failure(f) => Some(f),
            GameOutcome::Success { .. } => None,
        }
    }
}

/// Plays games of type `G`. Holds no state between games; every call to
/// [`GameRunner::play`] builds its own game.
pub struct GameRunner<G> {
    _game: PhantomData<fn() -> G>,
}

impl<G> Default for GameRunner<G> {
    fn default() -> Self {
        Self { _game: PhantomData }
    }
}

impl<G> Clone for GameRunner<G> {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl<G: Game> GameRunner<G> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Play one game. A missing seed is drawn at random and recorded so the
    /// game can be replayed.
    pub async fn play(&self, bot: &dyn Bot, seed: Option<u64>) -> GameResult<G::State> {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        let mut game = G::from_seed(seed);
        let mut history = vec![MoveRecord {
            request: None,
            response: None,
            state: game.state(),
        }];

        while !game.is_complete() {
            let request = game.next_bot_request();
            let response = match bot.respond(&request).await {
                Ok(r) => r,
                Err(e) => {
                    warn!("bot stopped after {} moves: {}", history.len() - 1, e);
                    let failure = BotFailure {
                        kind: e.kind(),
                        message: format!("{}: {}", e.kind(), e),
                        bot_request: Some(request),
                        bot_response: None,
                    };
                    return GameResult {
                        seed,
                        history,
                        outcome: GameOutcome::Failure(failure),
                    };
                }
            };
            if !game.apply_response(&response) {
                warn!("illegal move {:?} after {} moves", response.trim(), history.len() - 1);
                let failure = BotFailure {
                    kind: FailureKind::IllegalMove,
                    message: FailureKind::IllegalMove.to_string(),
                    bot_request: Some(request),
                    bot_response: Some(response),
                };
                return GameResult {
                    seed,
                    history,
                    outcome: GameOutcome::Failure(failure),
                };
            }
            history.push(MoveRecord {
                request: Some(request),
                response: Some(response),
                state: game.state(),
            });
        }

        let moves = history.len() - 1;
        debug!("game {} complete in {} moves", seed, moves);
        GameResult {
            seed,
            history,
            outcome: GameOutcome::Success {
                score: game.score(),
                moves,
            },
        }
    }
}
