//! stderr logging through `env_logger`.

use std::io::Write;

use clap::ValueEnum;
use log::LevelFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

/// Install the logger. `RUST_LOG`, when set, wins over `level`.
pub fn init(level: LogLevel) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level.into())
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .parse_default_env();
    // A second init (tests, embedding) keeps the first logger.
    let _ = builder.try_init();
}
