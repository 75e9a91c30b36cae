//! Logger setup for genwatch_app.
//!
//! The terminal is the user interface, so logs go to `./genwatch.log` unless
//! `GENWATCH_LOG_TO` asks for `terminal` or `both`. `GENWATCH_LOG_LEVEL`
//! overrides the default `info` level.

use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

const LOG_FILE: &str = "./genwatch.log";

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    File,
    Terminal,
    Both,
}

impl LogDestination {
    pub fn from_env() -> Self {
        match std::env::var("GENWATCH_LOG_TO").as_deref() {
            Ok("terminal") => LogDestination::Terminal,
            Ok("both") => LogDestination::Both,
            _ => LogDestination::File,
        }
    }
}

fn level_from_env() -> LevelFilter {
    std::env::var("GENWATCH_LOG_LEVEL")
        .ok()
        .and_then(|raw| LevelFilter::from_str(raw.trim()).ok())
        .unwrap_or(LevelFilter::Info)
}

pub fn initialize(destination: LogDestination) {
    let level = level_from_env();
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::File => match create_file_logger(level, config) {
            Some(file_logger) => vec![file_logger],
            None => return,
        },
        LogDestination::Terminal => vec![terminal_logger(level, config)],
        LogDestination::Both => {
            let mut loggers: Vec<Box<dyn SharedLogger>> =
                vec![terminal_logger(level, config.clone())];
            if let Some(file_logger) = create_file_logger(level, config) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        // Dependency chatter (hyper, rustls, tungstenite) stays out of the log.
        .add_filter_allow_str("genwatch")
        .build()
}

fn terminal_logger(level: LevelFilter, config: Config) -> Box<TermLogger> {
    TermLogger::new(level, config, TerminalMode::Stderr, ColorChoice::Auto)
}

fn create_file_logger(level: LevelFilter, config: Config) -> Option<Box<WriteLogger<File>>> {
    let log_path = PathBuf::from(LOG_FILE);
    match File::create(&log_path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", log_path, err);
            None
        }
    }
}
