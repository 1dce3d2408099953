//! Stderr logger for the CLI and the queue workers.
//!
//! Lines look like `  12.034s INFO  queue: b1 scored`: seconds since the
//! logger was installed, the level, and the module that logged with the
//! crate prefix dropped, so worker and queue lines are easy to tell apart.

use std::env;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

const CRATE_PREFIX: &str = "battlebots::";

struct WorkerLogger {
    started: OnceLock<Instant>,
}

impl WorkerLogger {
    fn elapsed(&self) -> f64 {
        self.started.get_or_init(Instant::now).elapsed().as_secs_f64()
    }
}

/// Short name of the module behind a log target.
fn origin(target: &str) -> &str {
    target.strip_prefix(CRATE_PREFIX).unwrap_or(target)
}

impl Log for WorkerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // stdout carries command output
        eprintln!(
            "{:>9.3}s {:<5} {}: {}",
            self.elapsed(),
            record.level(),
            origin(record.target()),
            record.args()
        );
    }

    fn flush(&self) {}
}

static LOGGER: WorkerLogger = WorkerLogger {
    started: OnceLock::new(),
};

/// Install the logger. The level comes from `BATTLEBOTS_LOG` and falls back
/// to `info`. Calling this more than once keeps the first logger.
pub fn init_logging() {
    let level = env::var("BATTLEBOTS_LOG")
        .ok()
        .and_then(|lvl| lvl.parse().ok())
        .unwrap_or(LevelFilter::Info);
    if log::set_logger(&LOGGER).is_ok() {
        LOGGER.started.get_or_init(Instant::now);
        log::set_max_level(level);
    }
}
