use std::env;

use log::{self, LevelFilter, Metadata, Record};

/// Environment variable selecting the log level.
const LOG_ENV_VAR: &str = "BATTLESHIP_SERVER_LOG";

struct ServerLogger;

impl log::Log for ServerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: ServerLogger = ServerLogger;

fn level_from(value: Option<String>) -> LevelFilter {
    value
        .and_then(|lvl| lvl.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Initialize logging with a level taken from `BATTLESHIP_SERVER_LOG`.
/// Defaults to `info` if the variable is not set or invalid.
pub fn init_logging() {
    let level = level_from(env::var(LOG_ENV_VAR).ok());
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(level));
}
