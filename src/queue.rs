//! Bounded work queues and the worker loops that drain them.
//!
//! Each queue has exactly one consumer. Producers never block: a full queue
//! is reported as [`QueueError::Full`] straight away. A worker handles one
//! message at a time and moves on to the next whatever the outcome; a panic
//! while handling a message is contained to that message.

use std::sync::Arc;

use log::{error, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::bot::BotFactory;
use crate::game::Game;
use crate::runner::GameRunner;
use crate::store::{BotRecord, ResultCache, ScoreStore, UserRecord};
use crate::tournament::{Tournament, TournamentResult};

/// Errors returned when enqueueing work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The queue is at capacity. The message was not queued.
    Full { queue: &'static str, capacity: usize },
    /// The worker has gone away.
    Closed { queue: &'static str },
}

impl core::fmt::Display for QueueError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            QueueError::Full { queue, capacity } => {
                write!(f, "{} queue is full ({} messages)", queue, capacity)
            }
            QueueError::Closed { queue } => write!(f, "{} queue is closed", queue),
        }
    }
}

impl std::error::Error for QueueError {}

/// A named FIFO with a fixed capacity.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    name: &'static str,
    capacity: usize,
    tx: mpsc::Sender<T>,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            capacity: self.capacity,
            tx: self.tx.clone(),
        }
    }
}

impl<T> BoundedQueue<T> {
    /// Create the queue and the receiving end for its single worker.
    pub fn new(name: &'static str, capacity: usize) -> (Self, mpsc::Receiver<T>) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        (Self { name, capacity, tx }, rx)
    }

    /// Messages currently waiting.
    pub fn len(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueue without waiting.
    pub fn try_push(&self, msg: T) -> Result<(), QueueError> {
        match self.tx.try_send(msg) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                error!("{} queue full", self.name);
                Err(QueueError::Full {
                    queue: self.name,
                    capacity: self.capacity,
                })
            }
            Err(TrySendError::Closed(_)) => Err(QueueError::Closed { queue: self.name }),
        }
    }
}

/// Request to play one game for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayRequest {
    /// Key the result is cached under.
    pub token: String,
    pub bot_id: String,
    pub seed: Option<u64>,
}

/// Request to score a submitted bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub user_id: String,
    pub bot_id: String,
}

/// Random 24-character hex token.
pub fn new_token() -> String {
    let mut bytes = [0u8; 12];
    rand::rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Fast queue of single games whose results are collected by token.
#[derive(Debug, Clone)]
pub struct InteractiveQueue {
    queue: BoundedQueue<PlayRequest>,
}

impl InteractiveQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PlayRequest>) {
        let (queue, rx) = BoundedQueue::new("interactive", capacity);
        (Self { queue }, rx)
    }

    /// Queue a game and return the token its result will be cached under.
    pub fn add(&self, bot_id: &str, seed: Option<u64>) -> Result<String, QueueError> {
        let token = new_token();
        self.queue.try_push(PlayRequest {
            token: token.clone(),
            bot_id: bot_id.to_string(),
            seed,
        })?;
        info!("{} queued for play as {}", bot_id, token);
        Ok(token)
    }

    pub fn queue(&self) -> &BoundedQueue<PlayRequest> {
        &self.queue
    }
}

/// Slow queue of whole tournaments.
#[derive(Debug, Clone)]
pub struct ScoringQueue {
    queue: BoundedQueue<ScoreRequest>,
}

impl ScoringQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ScoreRequest>) {
        let (queue, rx) = BoundedQueue::new("scoring", capacity);
        (Self { queue }, rx)
    }

    pub fn add(&self, user_id: &str, bot_id: &str) -> Result<(), QueueError> {
        self.queue.try_push(ScoreRequest {
            user_id: user_id.to_string(),
            bot_id: bot_id.to_string(),
        })?;
        info!("{} queued for scoring", bot_id);
        Ok(())
    }

    pub fn queue(&self) -> &BoundedQueue<ScoreRequest> {
        &self.queue
    }
}

/// Play one game and cache the serialized result under the request token.
pub async fn play_one<G: Game>(
    msg: &PlayRequest,
    bots: &dyn BotFactory,
    cache: &dyn ResultCache,
) -> anyhow::Result<()> {
    let bot = bots.bot(&msg.bot_id);
    let result = GameRunner::<G>::new().play(bot.as_ref(), msg.seed).await;
    let value = serde_json::to_string(&result)?;
    cache.put(&msg.token, value).await?;
    info!("{} played (success: {})", msg.bot_id, result.success());
    Ok(())
}

/// Persist a tournament outcome on the bot and its owner.
pub async fn record_tournament(
    store: &dyn ScoreStore,
    user_id: &str,
    bot_id: &str,
    result: &TournamentResult,
) -> anyhow::Result<()> {
    let mut bot = store
        .find_bot(bot_id)
        .await?
        .unwrap_or_else(|| BotRecord::new(bot_id, user_id));
    let mut user = store
        .find_user(user_id)
        .await?
        .unwrap_or_else(|| UserRecord::new(user_id));

    match result {
        TournamentResult::Completed(score) => {
            bot.score_success(score.score, score.avg_time);
            let state = user.scored_success(bot_id, score.score);
            info!("{} scored {:.4} ({:?})", bot_id, score.score, state);
        }
        TournamentResult::Aborted(aborted) => {
            bot.score_error(aborted.game_seed, &aborted.failure);
            user.scored_error(bot_id);
            warn!("{} {}", bot_id, aborted);
        }
    }

    store.save_bot(bot).await?;
    store.save_user(user).await
}

/// Run a tournament for one request and record the outcome.
pub async fn score_one<G: Game>(
    msg: &ScoreRequest,
    bots: &dyn BotFactory,
    store: &dyn ScoreStore,
    tournament: &Tournament,
) -> anyhow::Result<TournamentResult> {
    let bot = bots.bot(&msg.bot_id);
    let result = tournament.run::<G>(bot.as_ref()).await;
    record_tournament(store, &msg.user_id, &msg.bot_id, &result).await?;
    Ok(result)
}

/// Drain the interactive queue until every producer is gone.
pub async fn run_play_worker<G: Game + 'static>(
    mut rx: mpsc::Receiver<PlayRequest>,
    bots: Arc<dyn BotFactory>,
    cache: Arc<dyn ResultCache>,
) {
    while let Some(msg) = rx.recv().await {
        let bots = Arc::clone(&bots);
        let cache = Arc::clone(&cache);
        let token = msg.token.clone();
        let job = tokio::spawn(async move { play_one::<G>(&msg, bots.as_ref(), cache.as_ref()).await });
        match job.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("play {} failed: {:#}", token, e),
            Err(e) => error!("play {} panicked: {}", token, e),
        }
    }
    info!("interactive worker stopped");
}

/// Drain the scoring queue until every producer is gone.
pub async fn run_scoring_worker<G: Game + 'static>(
    mut rx: mpsc::Receiver<ScoreRequest>,
    bots: Arc<dyn BotFactory>,
    store: Arc<dyn ScoreStore>,
    tournament: Tournament,
) {
    while let Some(msg) = rx.recv().await {
        let bots = Arc::clone(&bots);
        let store = Arc::clone(&store);
        let tournament = tournament.clone();
        let bot_id = msg.bot_id.clone();
        let job = tokio::spawn(async move {
            score_one::<G>(&msg, bots.as_ref(), store.as_ref(), &tournament).await
        });
        match job.await {
            Ok(Ok(_)) => info!("{} scored", bot_id),
            Ok(Err(e)) => error!("scoring {} failed: {:#}", bot_id, e),
            Err(e) => error!("scoring {} panicked: {}", bot_id, e),
        }
    }
    info!("scoring worker stopped");
}

pub fn spawn_play_worker<G: Game + 'static>(
    rx: mpsc::Receiver<PlayRequest>,
    bots: Arc<dyn BotFactory>,
    cache: Arc<dyn ResultCache>,
) -> JoinHandle<()> {
    tokio::spawn(run_play_worker::<G>(rx, bots, cache))
}

pub fn spawn_scoring_worker<G: Game + 'static>(
    rx: mpsc::Receiver<ScoreRequest>,
    bots: Arc<dyn BotFactory>,
    store: Arc<dyn ScoreStore>,
    tournament: Tournament,
) -> JoinHandle<()> {
    tokio::spawn(run_scoring_worker::<G>(rx, bots, store, tournament))
}
