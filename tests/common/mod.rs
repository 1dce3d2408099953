#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use battlebots::{BattleshipsGame, Bot, BotError, BotFactory, ShipCell};

/// Index of the first cell the bot knows nothing about.
pub fn first_unknown(request: &str) -> Option<usize> {
    request.split(',').position(|c| c == "0")
}

/// Plays cells 0, 1, 2, ... in order.
pub struct Sequential;

#[async_trait::async_trait]
impl Bot for Sequential {
    async fn respond(&self, request: &str) -> Result<String, BotError> {
        first_unknown(request)
            .map(|i| format!("{}\n", i))
            .ok_or_else(|| BotError::Execution("board exhausted".into()))
    }
}

/// Always answers the same thing.
pub struct Always(pub &'static str);

#[async_trait::async_trait]
impl Bot for Always {
    async fn respond(&self, _request: &str) -> Result<String, BotError> {
        Ok(self.0.to_string())
    }
}

/// Always fails with the given error.
pub struct Failing(pub BotError);

#[async_trait::async_trait]
impl Bot for Failing {
    async fn respond(&self, _request: &str) -> Result<String, BotError> {
        Err(self.0.clone())
    }
}

/// Knows where the ships are and never misses.
pub struct Perfect {
    ships: Vec<usize>,
}

impl Perfect {
    pub fn for_seed(seed: u64) -> Self {
        Self {
            ships: ship_indices(&BattleshipsGame::new(seed)),
        }
    }
}

#[async_trait::async_trait]
impl Bot for Perfect {
    async fn respond(&self, request: &str) -> Result<String, BotError> {
        let cells: Vec<&str> = request.split(',').collect();
        self.ships
            .iter()
            .find(|&&i| cells[i] == "0")
            .map(|i| i.to_string())
            .ok_or_else(|| BotError::Execution("nothing left to hit".into()))
    }
}

/// Plays sequentially but answers garbage once the n-th game (1-based) starts.
pub struct FailsInGame {
    game: usize,
    started: AtomicUsize,
}

impl FailsInGame {
    pub fn new(game: usize) -> Self {
        Self {
            game,
            started: AtomicUsize::new(0),
        }
    }

    pub fn games_started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Bot for FailsInGame {
    async fn respond(&self, request: &str) -> Result<String, BotError> {
        if request.split(',').all(|c| c == "0") {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        if self.started.load(Ordering::SeqCst) == self.game {
            return Ok("abc".to_string());
        }
        Sequential.respond(request).await
    }
}

/// Bot ids starting with "bad" answer garbage; everything else is sequential.
pub struct FakeBots;

impl BotFactory for FakeBots {
    fn bot(&self, bot_id: &str) -> Box<dyn Bot> {
        if bot_id.starts_with("bad") {
            Box::new(Always("abc"))
        } else {
            Box::new(Sequential)
        }
    }
}

pub fn ship_indices(game: &BattleshipsGame) -> Vec<usize> {
    game.ships()
        .cells()
        .iter()
        .enumerate()
        .filter(|(_, c)| **c != ShipCell::Sea)
        .map(|(i, _)| i)
        .collect()
}
