mod board;
mod bot;
mod common;
mod config;
mod game;
mod logging;
pub mod queue;
mod runner;
mod ship;
pub mod store;
mod tournament;

pub use board::*;
pub use bot::*;
pub use common::*;
pub use config::*;
pub use game::*;
pub use logging::init_logging;
pub use queue::{
    BoundedQueue, InteractiveQueue, PlayRequest, QueueError, ScoreRequest, ScoringQueue,
};
pub use runner::*;
pub use ship::*;
pub use store::{MemoryCache, MemoryStore, ResultCache, ScoreStore};
pub use tournament::*;
