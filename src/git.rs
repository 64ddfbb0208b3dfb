//! Git subprocess invocation
//!
//! Every git call runs with an explicit working directory and an explicit
//! environment override (forcing the C locale so output is stable), rather
//! than mutating process-global state.

use anyhow::{Context, Result};
use log::debug;
use std::path::Path;
use std::process::Command;

/// Result of a single git invocation: the echoed command line, the captured
/// output lines (stdout then stderr) and the process exit code.
#[derive(Debug, Clone)]
pub struct GitInvocation {
    pub cmdline: String,
    pub lines: Vec<String>,
    pub code: i32,
}

impl GitInvocation {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Run `git <args>` inside `cwd`, capturing output and exit code.
///
/// A non-zero git exit code is not an error here; it is carried in the
/// returned invocation. Only a failure to spawn the process (git missing,
/// working directory gone) is reported as an error.
pub fn run_git(args: &[&str], cwd: &Path) -> Result<GitInvocation> {
    let cmdline = format!("git {}", args.join(" "));
    debug!("Running `{}` in {}", cmdline, cwd.display());

    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("LANGUAGE", "C")
        .env("LC_ALL", "C")
        .output()
        .with_context(|| format!("Failed to run `{}` in {}", cmdline, cwd.display()))?;

    let mut lines: Vec<String> = Vec::new();
    for stream in [&output.stdout, &output.stderr] {
        let text = String::from_utf8_lossy(stream);
        lines.extend(text.lines().map(str::to_string));
    }

    let code = output.status.code().unwrap_or(-1);
    debug!("`{}` exited with code {}", cmdline, code);

    Ok(GitInvocation { cmdline, lines, code })
}

/// Read the URL of the `origin` remote configured in a local checkout.
///
/// Local git metadata only; no network access. Returns `None` when the
/// remote is absent or the command fails.
pub fn origin_url(checkout: &Path) -> Result<Option<String>> {
    let inv = run_git(&["remote", "get-url", "origin"], checkout)?;
    if !inv.success() {
        return Ok(None);
    }
    Ok(inv
        .lines
        .first()
        .map(|line| line.trim().to_string())
        .filter(|url| !url.is_empty()))
}

/// Normalize a remote URL for comparison by stripping a trailing `.git`.
pub fn normalize_remote(url: &str) -> &str {
    let url = url.trim();
    url.strip_suffix(".git").unwrap_or(url)
}
