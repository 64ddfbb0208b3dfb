//! Terminal output helpers
//!
//! [`Style`] renders the per-plugin headers, with `--ascii` suppressing all
//! escape sequences. [`Echo`] mirrors captured git command lines and output
//! to the terminal (gated by the configured verbosity) and, when enabled,
//! appends them to the operation log file.

use chrono::{Local, SecondsFormat};
use colored::Colorize;
use log::warn;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Terminal emphasis, degraded to plain text under `--ascii`.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    ascii: bool,
}

impl Style {
    pub fn new(ascii: bool) -> Self {
        Self { ascii }
    }

    pub fn bold(&self, text: &str) -> String {
        if self.ascii {
            text.to_string()
        } else {
            text.bold().to_string()
        }
    }

    pub fn invert(&self, text: &str) -> String {
        if self.ascii {
            text.to_string()
        } else {
            text.reversed().to_string()
        }
    }
}

/// Echoes command/output pairs, and appends them to the log file when one is
/// configured. The log file is opened in append mode on every write; there
/// is no locking, so concurrent invocations against the same file are
/// unsupported.
#[derive(Debug, Clone)]
pub struct Echo {
    verbosity: u8,
    logfile: Option<PathBuf>,
}

impl Echo {
    pub fn new(verbosity: u8, logfile: Option<PathBuf>) -> Self {
        Self { verbosity, logfile }
    }

    /// Echo a command line and its captured output when the configured
    /// verbosity reaches `min_verbosity`; always append to the log file when
    /// `log` is set. Verbosity only affects terminal noise, never results.
    pub fn command(&self, cmdline: &str, lines: &[String], min_verbosity: u8, log: bool) {
        if self.verbosity >= min_verbosity {
            println!("  < {}", cmdline);
            for line in lines {
                println!("    > {}", line);
            }
        }
        if log {
            let mut text = format!("  < {}\n", cmdline);
            for line in lines {
                text.push_str(&format!("    > {}\n", line));
            }
            self.append(&text);
        }
    }

    /// Write a timestamped per-operation header to the log file.
    pub fn log_entry(&self, plugin_name: &str) {
        let stamp = Local::now().to_rfc3339_opts(SecondsFormat::Secs, false);
        self.append(&format!("\n{}  {}\n", stamp, plugin_name));
    }

    fn append(&self, text: &str) {
        let Some(path) = &self.logfile else {
            return;
        };
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(text.as_bytes()));
        if let Err(e) = written {
            warn!("Unable to append to log file {}: {}", path.display(), e);
        }
    }
}
