//! Common types: board errors and the bot failure taxonomy.

use serde::{Deserialize, Serialize};

/// Errors returned by Board operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    /// Coordinate lies outside the grid.
    OutOfBounds { x: usize, y: usize },
    /// Cell index is outside [0, N²).
    InvalidIndex(usize),
}

impl core::fmt::Display for BoardError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BoardError::OutOfBounds { x, y } => write!(f, "Coordinate ({}, {}) is out of bounds", x, y),
            BoardError::InvalidIndex(i) => write!(f, "Cell index {} is out of range", i),
        }
    }
}

impl std::error::Error for BoardError {}

/// Why a bot was stopped during a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The bot answered with something the game rejected.
    #[serde(rename = "BOT_MOVE_ILLEGAL")]
    IllegalMove,
    /// The bot did not answer within the move timeout.
    #[serde(rename = "BOT_TIMEOUT")]
    Timeout,
    /// The bot could not be launched or exited unsuccessfully.
    #[serde(rename = "BOT_ERROR")]
    ExecutionError,
}

impl FailureKind {
    /// Stable tag persisted alongside failed games.
    pub fn error_type(&self) -> &'static str {
        match self {
            FailureKind::IllegalMove => "BOT_MOVE_ILLEGAL",
            FailureKind::Timeout => "BOT_TIMEOUT",
            FailureKind::ExecutionError => "BOT_ERROR",
        }
    }
}

impl core::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FailureKind::IllegalMove => write!(f, "The bot made an illegal move"),
            FailureKind::Timeout => write!(f, "The bot took too long to make a move"),
            FailureKind::ExecutionError => write!(f, "The bot raised an error"),
        }
    }
}
