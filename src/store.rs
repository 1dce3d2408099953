//! Collaborators the workers hand results to: a short-lived result cache
//! for interactive games and a durable store for bot and user records.
//!
//! Both are traits so the process entry point decides which backend to
//! construct and pass in. The in-memory versions back the CLI worker and
//! the tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::common::FailureKind;
use crate::runner::BotFailure;
use crate::tournament::is_improvement;

/// Keyed single-read storage for serialized game results.
#[async_trait::async_trait]
pub trait ResultCache: Send + Sync {
    /// Store `value` under `token`, replacing any previous entry.
    async fn put(&self, token: &str, value: String) -> anyhow::Result<()>;
    /// Remove and return the entry for `token`. A second call returns `None`.
    async fn take(&self, token: &str) -> anyhow::Result<Option<String>>;
}

/// In-process [`ResultCache`] whose entries expire after a fixed TTL.
pub struct MemoryCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, String)>>,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, HashMap<String, (Instant, String)>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("result cache lock poisoned"))
    }
}

#[async_trait::async_trait]
impl ResultCache for MemoryCache {
    async fn put(&self, token: &str, value: String) -> anyhow::Result<()> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        entries.retain(|_, (expires, _)| *expires > now);
        entries.insert(token.to_string(), (now + self.ttl, value));
        Ok(())
    }

    async fn take(&self, token: &str) -> anyhow::Result<Option<String>> {
        let mut entries = self.lock()?;
        match entries.remove(token) {
            Some((expires, value)) if expires > Instant::now() => Ok(Some(value)),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotState {
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotRecord {
    pub id: String,
    pub user_id: String,
    pub state: BotState,
    pub score: Option<f64>,
    pub avg_time: Option<f64>,
    /// Seed of the game that failed, for replay.
    pub game_seed: Option<u64>,
    pub error_type: Option<FailureKind>,
    pub error_message: Option<String>,
}

impl BotRecord {
    pub fn new(id: &str, user_id: &str) -> Self {
        Self {
            id: id.to_string(),
            user_id: user_id.to_string(),
            state: BotState::Pending,
            score: None,
            avg_time: None,
            game_seed: None,
            error_type: None,
            error_message: None,
        }
    }

    pub fn score_success(&mut self, score: f64, avg_time: f64) {
        self.state = BotState::Success;
        self.score = Some(score);
        self.avg_time = Some(avg_time);
        self.game_seed = None;
        self.error_type = None;
        self.error_message = None;
    }

    /// Record the failure that stopped scoring and the seed to replay it.
    pub fn score_error(&mut self, game_seed: u64, failure: &BotFailure) {
        self.state = BotState::Error;
        self.game_seed = Some(game_seed);
        self.error_type = Some(failure.kind);
        self.error_message = Some(failure.message.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserState {
    /// No bot submitted yet.
    New,
    /// A bot is waiting to be scored.
    Pending,
    /// The last bot failed.
    Error,
    /// The last bot scored, but not the user's best.
    Success,
    /// The last bot set the user's best score.
    Best,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestScore {
    pub score: f64,
    pub bot_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Unix seconds.
    pub time: u64,
    pub bot_id: String,
    pub value: Option<f64>,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub state: UserState,
    pub best_score: Option<BestScore>,
    pub history: Vec<ScoreEntry>,
}

impl UserRecord {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            state: UserState::New,
            best_score: None,
            history: Vec::new(),
        }
    }

    pub fn mark_pending(&mut self) {
        self.state = UserState::Pending;
    }

    /// Record a successful scoring. Returns the resulting state.
    pub fn scored_success(&mut self, bot_id: &str, score: f64) -> UserState {
        let previous = self.best_score.as_ref().map(|b| b.score);
        if is_improvement(previous, score) {
            self.best_score = Some(BestScore {
                score,
                bot_id: bot_id.to_string(),
            });
            self.state = UserState::Best;
        } else {
            self.state = UserState::Success;
        }
        self.history.push(ScoreEntry {
            time: unix_now(),
            bot_id: bot_id.to_string(),
            value: Some(score),
            success: true,
        });
        self.state
    }

    pub fn scored_error(&mut self, bot_id: &str) {
        self.state = UserState::Error;
        self.history.push(ScoreEntry {
            time: unix_now(),
            bot_id: bot_id.to_string(),
            value: None,
            success: false,
        });
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Durable bot and user records. Each call is an atomic point read or write.
#[async_trait::async_trait]
pub trait ScoreStore: Send + Sync {
    async fn find_bot(&self, bot_id: &str) -> anyhow::Result<Option<BotRecord>>;
    async fn save_bot(&self, bot: BotRecord) -> anyhow::Result<()>;
    async fn find_user(&self, user_id: &str) -> anyhow::Result<Option<UserRecord>>;
    async fn save_user(&self, user: UserRecord) -> anyhow::Result<()>;
    /// Users with a best score, best first.
    async fn ranked_users(&self, limit: usize) -> anyhow::Result<Vec<UserRecord>>;
}

#[derive(Default)]
pub struct MemoryStore {
    bots: Mutex<HashMap<String, BotRecord>>,
    users: Mutex<HashMap<String, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow::anyhow!("store lock poisoned")
}

#[async_trait::async_trait]
impl ScoreStore for MemoryStore {
    async fn find_bot(&self, bot_id: &str) -> anyhow::Result<Option<BotRecord>> {
        Ok(self.bots.lock().map_err(poisoned)?.get(bot_id).cloned())
    }

    async fn save_bot(&self, bot: BotRecord) -> anyhow::Result<()> {
        self.bots.lock().map_err(poisoned)?.insert(bot.id.clone(), bot);
        Ok(())
    }

    async fn find_user(&self, user_id: &str) -> anyhow::Result<Option<UserRecord>> {
        Ok(self.users.lock().map_err(poisoned)?.get(user_id).cloned())
    }

    async fn save_user(&self, user: UserRecord) -> anyhow::Result<()> {
        self.users.lock().map_err(poisoned)?.insert(user.id.clone(), user);
        Ok(())
    }

    async fn ranked_users(&self, limit: usize) -> anyhow::Result<Vec<UserRecord>> {
        let users = self.users.lock().map_err(poisoned)?;
        let mut ranked: Vec<UserRecord> = users
            .values()
            .filter(|u| u.best_score.is_some())
            .cloned()
            .collect();
        ranked.sort_by(|a, b| {
            let a = a.best_score.as_ref().map_or(0.0, |s| s.score);
            let b = b.best_score.as_ref().map_or(0.0, |s| s.score);
            b.total_cmp(&a)
        });
        ranked.truncate(limit);
        Ok(ranked)
    }
}

/// Register a freshly submitted bot and flag its owner as waiting.
pub async fn submit_bot(store: &dyn ScoreStore, user_id: &str, bot_id: &str) -> anyhow::Result<()> {
    store.save_bot(BotRecord::new(bot_id, user_id)).await?;
    let mut user = store
        .find_user(user_id)
        .await?
        .unwrap_or_else(|| UserRecord::new(user_id));
    user.mark_pending();
    store.save_user(user).await
}
