//! Logger setup and the `trace!`..`error!` macros used across the workspace.

mod consts;

use consts::{LOG_LINE_PATTERN, LOG_LINE_PATTERN_COLORED};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;
use std::str::FromStr;

const CONSOLE_APPENDER: &str = "stdout";
const FILE_APPENDER: &str = "log_file";
const LOG_FILE_NAME: &str = "diadem.log";

/// Initializes the global logger: a colored console appender, plus a plain
/// file appender when a log directory is supplied. `level` is parsed
/// leniently and falls back to `info`. Repeated calls are no-ops.
pub fn init_logger(log_dir: Option<&str>, level: &str) {
    let level = LevelFilter::from_str(level).unwrap_or(LevelFilter::Info);

    let console = ConsoleAppender::builder().encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN_COLORED))).build();
    let mut names = vec![CONSOLE_APPENDER];
    let mut appenders = vec![Appender::builder().build(CONSOLE_APPENDER, Box::new(console))];
    if let Some(log_dir) = log_dir {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
            .build(Path::new(log_dir).join(LOG_FILE_NAME));
        if let Ok(file) = file {
            names.push(FILE_APPENDER);
            appenders.push(Appender::builder().build(FILE_APPENDER, Box::new(file)));
        }
    }

    let config = Config::builder()
        .appenders(appenders)
        .logger(Logger::builder().build("mio", LevelFilter::Off))
        .logger(Logger::builder().build("tokio", LevelFilter::Off))
        .build(Root::builder().appenders(names).build(level));
    if let Ok(config) = config {
        let _ = log4rs::init_config(config);
    }
}

#[macro_export]
macro_rules! trace {
    ($($t:tt)*) => ( log::trace!($($t)*) )
}

#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => ( log::debug!($($t)*) )
}

#[macro_export]
macro_rules! info {
    ($($t:tt)*) => ( log::info!($($t)*) )
}

#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => ( log::warn!($($t)*) )
}

#[macro_export]
macro_rules! error {
    ($($t:tt)*) => ( log::error!($($t)*) )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_sets_requested_level() {
        init_logger(None, "debug");
        assert!(log::max_level() >= LevelFilter::Debug);
        crate::debug!("logger initialized");
    }
}
