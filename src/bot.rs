//! Bots: anything that turns a request string into a response string.
//!
//! [`ProcessBot`] is the real sandbox. Each call launches the executable as
//! a fresh child process with the request as its final argument and waits
//! at most `timeout` for it to exit. The child handle is owned by the wait
//! future and the process is killed when that future is dropped, so every
//! exit path (success, failure, timeout, panic) releases it, and the timer
//! dies with the `timeout` future instead of outliving the call.
//!
//! Output is read through a fixed cap. A legal answer is one short line, so
//! anything past [`MAX_RESPONSE_BYTES`] on stdout is drained and discarded
//! and the answer is rejected as an illegal move.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::common::FailureKind;

/// Most stdout kept from one bot invocation.
pub const MAX_RESPONSE_BYTES: usize = 4096;
/// Most stderr kept for an execution error message.
const MAX_STDERR_BYTES: usize = 1024;

/// Errors produced while invoking a bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotError {
    /// No response within the limit.
    Timeout(Duration),
    /// Launch failure or unsuccessful exit.
    Execution(String),
    /// Stdout ran past the given byte limit.
    Oversized(usize),
}

impl BotError {
    pub fn kind(&self) -> FailureKind {
        match self {
            BotError::Timeout(_) => FailureKind::Timeout,
            BotError::Execution(_) => FailureKind::ExecutionError,
            BotError::Oversized(_) => FailureKind::IllegalMove,
        }
    }
}

impl core::fmt::Display for BotError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BotError::Timeout(limit) => write!(f, "no response within {:?}", limit),
            BotError::Execution(msg) => write!(f, "{}", msg),
            BotError::Oversized(limit) => write!(f, "response longer than {} bytes", limit),
        }
    }
}

impl std::error::Error for BotError {}

#[async_trait::async_trait]
pub trait Bot: Send + Sync {
    /// Produce the bot's raw answer to `request`.
    async fn respond(&self, request: &str) -> Result<String, BotError>;
}

/// A bot living in an external executable.
#[derive(Debug, Clone)]
pub struct ProcessBot {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessBot {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self::with_args(program, Vec::new(), timeout)
    }

    /// A bot invoked as `program args... <request>`.
    pub fn with_args(program: impl Into<PathBuf>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }
}

/// Read at most `limit` bytes from `reader`, then drain the rest so the
/// child never blocks on a full pipe. The flag is set when bytes were dropped.
async fn read_capped<R: AsyncRead + Unpin>(
    reader: Option<R>,
    limit: usize,
) -> std::io::Result<(Vec<u8>, bool)> {
    let Some(mut reader) = reader else {
        return Ok((Vec::new(), false));
    };
    let mut buf = Vec::with_capacity(limit.min(256));
    (&mut reader).take(limit as u64 + 1).read_to_end(&mut buf).await?;
    let over = buf.len() > limit;
    if over {
        buf.truncate(limit);
        tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    }
    Ok((buf, over))
}

#[async_trait::async_trait]
impl Bot for ProcessBot {
    async fn respond(&self, request: &str) -> Result<String, BotError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(request)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                BotError::Execution(format!("failed to launch {}: {}", self.program.display(), e))
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let collect = async {
            let (out, err, status) = tokio::join!(
                read_capped(stdout, MAX_RESPONSE_BYTES),
                read_capped(stderr, MAX_STDERR_BYTES),
                child.wait()
            );
            Ok::<_, std::io::Error>((out?, err?.0, status?))
        };

        let collected = tokio::time::timeout(self.timeout, collect).await;
        let ((stdout, oversized), stderr, status) = match collected {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(BotError::Execution(format!(
                    "failed to collect output of {}: {}",
                    self.program.display(),
                    e
                )))
            }
            Err(_) => {
                debug!("{} timed out after {:?}", self.program.display(), self.timeout);
                return Err(BotError::Timeout(self.timeout));
            }
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(BotError::Execution(format!(
                "{} exited with {}: {}",
                self.program.display(),
                status,
                stderr.trim()
            )));
        }
        if oversized {
            debug!("{} wrote more than {} bytes", self.program.display(), MAX_RESPONSE_BYTES);
            return Err(BotError::Oversized(MAX_RESPONSE_BYTES));
        }
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// Resolves bot ids from queue messages to runnable bots.
pub trait BotFactory: Send + Sync {
    fn bot(&self, bot_id: &str) -> Box<dyn Bot>;
}

/// Bots stored as executables named by their id inside one directory.
#[derive(Debug, Clone)]
pub struct ProcessBots {
    dir: PathBuf,
    timeout: Duration,
}

impl ProcessBots {
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            dir: dir.into(),
            timeout,
        }
    }

    /// Path of the executable for `bot_id`. Only the final path component
    /// of the id is used, so ids cannot point outside the directory.
    pub fn path(&self, bot_id: &str) -> PathBuf {
        match Path::new(bot_id).file_name() {
            Some(name) => self.dir.join(name),
            None => self.dir.clone(),
        }
    }
}

impl BotFactory for ProcessBots {
    fn bot(&self, bot_id: &str) -> Box<dyn Bot> {
        Box::new(ProcessBot::new(self.path(bot_id), self.timeout))
    }
}
