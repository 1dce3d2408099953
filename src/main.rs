use std::path::PathBuf;
use std::sync::Arc;

use battlebots::{
    init_logging,
    queue::{spawn_play_worker, spawn_scoring_worker},
    store::submit_bot,
    BattleshipsGame, BotFactory, GameRunner, InteractiveQueue, MemoryCache, MemoryStore,
    ProcessBot, ProcessBots, ResultCache, ScoreStore, ScoringQueue, Settings, Tournament,
};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the per-move timeout in seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single game against a bot executable and print the result.
    Play {
        #[arg(long)]
        bot: PathBuf,
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
    /// Score a bot executable over a tournament and print the result.
    Score {
        #[arg(long)]
        bot: PathBuf,
        #[arg(long)]
        games: Option<usize>,
        #[arg(long, help = "Seed of the first game; later games use seed + i")]
        seed: Option<u64>,
    },
    /// Run both work queues, taking JSON requests line by line on stdin.
    Worker {
        #[arg(long)]
        bot_dir: Option<PathBuf>,
    },
}

/// One line of worker input.
#[derive(Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum Request {
    Play { bot_id: String, seed: Option<u64> },
    Score { user_id: String, bot_id: String },
    Result { token: String },
    User { user_id: String },
    Bot { bot_id: String },
    Ranking { limit: Option<usize> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(t) = cli.timeout_secs {
        settings.move_timeout_secs = t;
    }

    match cli.command {
        Commands::Play { bot, seed } => {
            let bot = ProcessBot::new(bot, settings.move_timeout());
            let result = GameRunner::<BattleshipsGame>::new().play(&bot, seed).await;
            println!("{}", serde_json::to_string(&result)?);
        }
        Commands::Score { bot, games, seed } => {
            let bot = ProcessBot::new(bot, settings.move_timeout());
            let mut tournament = Tournament::new(games.unwrap_or(settings.games_per_tournament));
            if let Some(s) = seed {
                tournament = tournament.with_seed(s);
            }
            let result = tournament.run::<BattleshipsGame>(&bot).await;
            println!("{}", serde_json::to_string(&result)?);
        }
        Commands::Worker { bot_dir } => {
            if let Some(dir) = bot_dir {
                settings.bot_dir = dir;
            }
            run_worker(settings).await?;
        }
    }
    Ok(())
}

async fn run_worker(settings: Settings) -> anyhow::Result<()> {
    let bots: Arc<dyn BotFactory> = Arc::new(ProcessBots::new(
        settings.bot_dir.clone(),
        settings.move_timeout(),
    ));
    let cache: Arc<dyn ResultCache> = Arc::new(MemoryCache::new(settings.result_ttl()));
    let store: Arc<dyn ScoreStore> = Arc::new(MemoryStore::new());

    let (interactive, play_rx) = InteractiveQueue::new(settings.interactive_capacity);
    let (scoring, score_rx) = ScoringQueue::new(settings.scoring_capacity);
    let play_worker = spawn_play_worker::<BattleshipsGame>(play_rx, Arc::clone(&bots), Arc::clone(&cache));
    let score_worker = spawn_scoring_worker::<BattleshipsGame>(
        score_rx,
        Arc::clone(&bots),
        Arc::clone(&store),
        Tournament::new(settings.games_per_tournament),
    );
    log::info!("worker ready, bots in {}", settings.bot_dir.display());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = match serde_json::from_str::<Request>(&line) {
            Ok(req) => handle(req, &interactive, &scoring, cache.as_ref(), store.as_ref()).await,
            Err(e) => json!({ "error": format!("bad request: {}", e) }),
        };
        println!("{}", reply);
    }

    // closing the queues lets the workers finish what is queued, then stop
    drop(interactive);
    drop(scoring);
    let (played, scored) = tokio::join!(play_worker, score_worker);
    played?;
    scored?;
    Ok(())
}

async fn handle(
    req: Request,
    interactive: &InteractiveQueue,
    scoring: &ScoringQueue,
    cache: &dyn ResultCache,
    store: &dyn ScoreStore,
) -> serde_json::Value {
    let reply = async {
        let value = match req {
            Request::Play { bot_id, seed } => match interactive.add(&bot_id, seed) {
                Ok(token) => json!({ "token": token }),
                Err(e) => json!({ "error": e.to_string() }),
            },
            Request::Score { user_id, bot_id } => {
                submit_bot(store, &user_id, &bot_id).await?;
                match scoring.add(&user_id, &bot_id) {
                    Ok(()) => json!({ "queued": bot_id }),
                    Err(e) => json!({ "error": e.to_string() }),
                }
            }
            Request::Result { token } => match cache.take(&token).await? {
                Some(raw) => serde_json::from_str(&raw)?,
                None => json!(null),
            },
            Request::User { user_id } => serde_json::to_value(store.find_user(&user_id).await?)?,
            Request::Bot { bot_id } => serde_json::to_value(store.find_bot(&bot_id).await?)?,
            Request::Ranking { limit } => {
                serde_json::to_value(store.ranked_users(limit.unwrap_or(1000)).await?)?
            }
        };
        Ok::<serde_json::Value, anyhow::Error>(value)
    };
    reply
        .await
        .unwrap_or_else(|e| json!({ "error": format!("{:#}", e) }))
}
