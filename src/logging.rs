//! Diagnostics logging
//!
//! Wires the `log` facade to a small logger supporting text or JSON lines,
//! written to the console, a file, or both. This is developer-facing
//! diagnostics; the per-operation command log that mirrors git output into
//! `.gitplugins.log` lives in [`crate::display`].

use anyhow::{Context, Result};
use chrono::Local;
use log::{Level, LevelFilter};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}. Valid options: text, json", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    Console,
    Both(PathBuf),
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LevelFilter,
    pub format: LogFormat,
    pub destination: LogDestination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            format: LogFormat::Text,
            destination: LogDestination::Console,
        }
    }
}

#[derive(Serialize)]
struct JsonLogEntry<'a> {
    timestamp: String,
    level: String,
    message: &'a str,
}

struct GitpLogger {
    config: LogConfig,
}

impl GitpLogger {
    fn format(&self, level: Level, message: &str) -> String {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        match self.config.format {
            LogFormat::Text => {
                format!("{} [{}] {}", timestamp, level.to_string().to_uppercase(), message)
            }
            LogFormat::Json => {
                let entry = JsonLogEntry {
                    timestamp,
                    level: level.to_string().to_uppercase(),
                    message,
                };
                serde_json::to_string(&entry)
                    .unwrap_or_else(|_| format!("[{}] {}", level, message))
            }
        }
    }
}

impl log::Log for GitpLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.config.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let formatted = self.format(record.level(), &record.args().to_string());
        let _ = writeln!(io::stderr(), "{}", formatted);
        if let LogDestination::Both(path) = &self.config.destination {
            let appended = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| writeln!(file, "{}", formatted));
            if let Err(e) = appended {
                eprintln!("File logging error for {}: {}", path.display(), e);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Install the global logger. Must be called once, before any log output.
pub fn init_logger(config: LogConfig) -> Result<()> {
    let level = config.level;
    log::set_boxed_logger(Box::new(GitpLogger { config }))
        .context("Failed to set global logger")?;
    log::set_max_level(level);
    Ok(())
}
