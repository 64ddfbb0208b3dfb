//! Plugin records, diagnosis and per-plugin operations
//!
//! Each declared plugin is a directory inside the application tree, bound to
//! a git repository. Operations shell out to git with an explicit working
//! directory; the git exit code propagates as the operation result.

use anyhow::Result;
use chrono::Local;
use log::debug;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PluginConfig;
use crate::display::Echo;
use crate::git;

pub const RETURN_OK: i32 = 0;
pub const RETURN_ERROR: i32 = 1;

/// Classification of a plugin's on-disk/git consistency at a point in time.
/// Always derived fresh from the filesystem and local git metadata; never
/// persisted across invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnosis {
    Ok,
    NotExist,
    NotGit,
    Malformed,
    InconsistentRemote,
}

impl Diagnosis {
    /// Every state, in display order for the diagnostic report.
    pub const ALL: [Diagnosis; 5] = [
        Diagnosis::Ok,
        Diagnosis::NotExist,
        Diagnosis::NotGit,
        Diagnosis::Malformed,
        Diagnosis::InconsistentRemote,
    ];

    pub fn message(&self) -> &'static str {
        match self {
            Diagnosis::Ok => "OK: plugin directory exists, and is a git checkout",
            Diagnosis::NotExist => "plugin directory DOES NOT exist",
            Diagnosis::NotGit => "plugin directory exists but IS NOT a git checkout",
            Diagnosis::Malformed => "plugin declaration malformed in the config file",
            Diagnosis::InconsistentRemote => {
                "local origin remote differs from the declared repository"
            }
        }
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// One declared plugin and its last computed diagnosis.
#[derive(Debug, Clone)]
pub struct PluginRecord {
    pub name: String,
    pub path: String,
    pub repository: String,
    pub branch: Option<String>,
    pub revision: Option<String>,
    /// Set by [`PluginRecord::set_diagnostic`]; `None` until diagnosed.
    pub diagnosis: Option<Diagnosis>,
    pub diag_detail: String,
    dir: PathBuf,
    root: PathBuf,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Join a declared plugin path onto the application root. Declared paths
/// historically start with `/` but are always relative to the root.
fn join_root(root: &Path, declared: &str) -> PathBuf {
    root.join(declared.trim_start_matches('/'))
}

impl PluginRecord {
    pub fn new(name: &str, config: PluginConfig, root: &Path) -> Self {
        let dir = join_root(root, &config.path);
        Self {
            name: name.to_string(),
            path: config.path,
            repository: config.gitrepository,
            branch: non_empty(config.gitbranch),
            revision: non_empty(config.gitrevision),
            diagnosis: None,
            diag_detail: String::new(),
            dir,
            root: root.to_path_buf(),
        }
    }

    /// The plugin directory inside the application tree.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Diagnostic message for the current state, for warnings.
    pub fn diag_message(&self) -> &'static str {
        match self.diagnosis {
            Some(diagnosis) => diagnosis.message(),
            None => "not yet diagnosed",
        }
    }

    /// Recompute the diagnosis from the current filesystem and local git
    /// metadata. Short-circuits at the first matching state. No network
    /// access: the remote URL is read from the checkout's configuration.
    pub fn set_diagnostic(&mut self) -> Result<Diagnosis> {
        self.diag_detail.clear();

        let diagnosis = if self.path.trim().is_empty() {
            Diagnosis::Malformed
        } else if !self.dir.is_dir() {
            Diagnosis::NotExist
        } else if !self.dir.join(".git").is_dir() {
            Diagnosis::NotGit
        } else {
            let local = git::origin_url(&self.dir)?.unwrap_or_default();
            let declared = &self.repository;
            if declared.is_empty()
                || local.is_empty()
                || git::normalize_remote(declared) != git::normalize_remote(&local)
            {
                self.diag_detail = format!(
                    "inconsistent repositories (config) \"{}\" vs (local) \"{}\"",
                    declared, local
                );
                Diagnosis::InconsistentRemote
            } else {
                Diagnosis::Ok
            }
        };

        debug!("Diagnosis for {}: {:?}", self.name, diagnosis);
        self.diagnosis = Some(diagnosis);
        Ok(diagnosis)
    }

    /// Install the plugin with `git clone`. Only valid on a plugin diagnosed
    /// as absent; anything else is a per-plugin warning, without any git
    /// invocation.
    pub fn install(&self, echo: &Echo) -> Result<i32> {
        if self.diagnosis != Some(Diagnosis::NotExist) {
            println!(
                "Warning ! Unable to install plugin {} ; already exists in {}.",
                self.name, self.path
            );
            return Ok(RETURN_ERROR);
        }

        if let Err(e) = fs::create_dir(&self.dir) {
            println!("ERROR ! Unable to create {}: {}", self.path, e);
            return Ok(RETURN_ERROR);
        }

        let target = self.dir.to_string_lossy().to_string();
        let mut args = vec!["clone"];
        if let Some(branch) = &self.branch {
            args.push("-b");
            args.push(branch);
        }
        args.extend(["--", self.repository.as_str(), target.as_str()]);

        let inv = git::run_git(&args, &self.root)?;
        echo.command(&inv.cmdline, &inv.lines, 1, true);
        Ok(inv.code)
    }

    /// Upgrade the plugin: fetch, then checkout the declared branch or
    /// revision if any, then rebase. Only valid on a plugin diagnosed OK.
    pub fn upgrade(&self, echo: &Echo) -> Result<i32> {
        if self.diagnosis != Some(Diagnosis::Ok) {
            println!(
                "Warning, unable to update {} ! {}  {}.",
                self.name,
                self.path,
                self.diag_message()
            );
            return Ok(RETURN_ERROR);
        }

        let inv = git::run_git(&["log", "-1", "--oneline"], &self.dir)?;
        echo.command(&inv.cmdline, &inv.lines, 1, false);
        let inv = git::run_git(&["fetch"], &self.dir)?;
        echo.command(&inv.cmdline, &inv.lines, 1, false);

        let target = self.branch.as_deref().or(self.revision.as_deref());
        if let Some(target) = target {
            let inv = git::run_git(&["checkout", target], &self.dir)?;
            echo.command(&inv.cmdline, &inv.lines, 1, true);
        }
        let inv = git::run_git(&["rebase"], &self.dir)?;
        echo.command(&inv.cmdline, &inv.lines, 1, true);
        Ok(inv.code)
    }

    /// `git status` plus a tally of the two-character short-status codes.
    /// An inaccessible directory or an inconsistent remote yields an error
    /// result with a synthetic tally entry.
    pub fn status(&self, echo: &Echo) -> Result<(i32, BTreeMap<String, usize>)> {
        if !self.dir.is_dir() {
            println!("ERROR ! Unable to access {}", self.path);
            return Ok((RETURN_ERROR, BTreeMap::from([("ZZ".to_string(), 1)])));
        }
        if self.diagnosis == Some(Diagnosis::InconsistentRemote) {
            println!("ERROR ! {}", self.diag_detail);
            return Ok((RETURN_ERROR, BTreeMap::from([("ZX".to_string(), 1)])));
        }

        let inv = git::run_git(&["status"], &self.dir)?;
        echo.command(&inv.cmdline, &inv.lines, 2, false);
        let code = inv.code;

        let short = git::run_git(&["status", "--short"], &self.dir)?;
        Ok((code, tally_short_status(&short.lines)))
    }

    /// Print the declared attributes, then the checkout's remotes and
    /// branches for informational display (always echoed).
    pub fn detail(&self, echo: &Echo) -> Result<i32> {
        println!("Name: {}", self.name);
        println!("Repository: {}", self.repository);
        println!("Path: {}", self.path);
        println!("Branch: {}", self.branch.as_deref().unwrap_or(""));
        println!("Revision: {}", self.revision.as_deref().unwrap_or(""));

        if !self.dir.is_dir() {
            println!("ERROR ! Unable to access {}", self.path);
            return Ok(RETURN_ERROR);
        }

        let inv = git::run_git(&["remote", "-v"], &self.dir)?;
        echo.command(&inv.cmdline, &inv.lines, 0, false);
        let inv = git::run_git(&["branch", "-v", "-a"], &self.dir)?;
        echo.command(&inv.cmdline, &inv.lines, 0, false);
        Ok(RETURN_OK)
    }

    /// Structural checks on the declaration plus a reachability probe of the
    /// declared repository. Returns advisory alerts; an empty list means the
    /// declaration looks sound. Probe failures are never fatal to the run.
    pub fn check_config(&self) -> Result<Vec<String>> {
        let mut alerts = Vec::new();

        let parent_ok = self
            .dir
            .parent()
            .map(Path::is_dir)
            .unwrap_or(false);
        if self.path.trim().is_empty() || !parent_ok {
            alerts.push(format!("Invalid path: {}", self.path));
        }

        if !url_scheme_ok(&self.repository) {
            alerts.push(format!(
                "Invalid URL for repository: \"{}\"",
                self.repository
            ));
        }

        // dummy credentials suppress interactive auth prompts
        let probe_url = self.repository.replace("://", "://FAKE:FAKE@");
        let mut args = vec!["ls-remote", "--exit-code", probe_url.as_str()];
        if let Some(branch) = &self.branch {
            args.push(branch);
        }
        let inv = git::run_git(&args, &self.root)?;
        if !inv.success() {
            alerts.push(format!(
                "Git repository does not exist or unreachable or branch does not exist: \"{} ({})\"",
                self.repository,
                self.branch.as_deref().unwrap_or("")
            ));
        }

        if self.branch.is_some() && self.revision.is_some() {
            alerts.push("You must declare AT MOST one branch OR one revision".to_string());
        }

        Ok(alerts)
    }

    /// Rename a plugin directory that is not a git checkout, preserving its
    /// contents for manual recovery. Every other state is left unchanged.
    pub fn cleanup(&self) -> (i32, String) {
        if self.diagnosis != Some(Diagnosis::NotGit) {
            return (RETURN_OK, "  unchanged".to_string());
        }

        let timestamp = Local::now().timestamp();
        let to = PathBuf::from(format!("{}.gpcleanup-{}", self.dir.display(), timestamp));
        match fs::rename(&self.dir, &to) {
            Ok(()) => (RETURN_OK, format!("  renamed to {}", to.display())),
            Err(e) => (
                RETURN_ERROR,
                format!("  ERROR ! unable to rename {}: {}", self.dir.display(), e),
            ),
        }
    }
}

/// Accepted repository URL shapes: `http(s)://...` or the SCP-like
/// `user@host:path` form.
fn url_scheme_ok(repository: &str) -> bool {
    let http = Regex::new(r"^https?://").unwrap();
    let scp = Regex::new(r".*@.*:").unwrap();
    http.is_match(repository) || scp.is_match(repository)
}

/// Tally the first two characters of each `git status --short` line into a
/// code -> count mapping.
pub fn tally_short_status(lines: &[String]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for line in lines {
        let code: String = line.chars().take(2).collect();
        if code.is_empty() {
            continue;
        }
        *counts.entry(code).or_insert(0) += 1;
    }
    counts
}
