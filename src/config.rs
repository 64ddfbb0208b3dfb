//! Configuration loading
//!
//! The application root comes from the `GITPLUGINS_ROOT` environment
//! variable; the plugin declarations live in a TOML file inside it
//! (`.gitplugins.toml` unless overridden with `--config`). Declaration
//! order of the `[plugins.*]` tables is preserved.

use log::{debug, info};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable locating the managed application tree.
pub const ROOT_ENV: &str = "GITPLUGINS_ROOT";

/// Default configuration file name, relative to the application root.
pub const CONFIG_FILE: &str = ".gitplugins.toml";

/// Default operation log file name, relative to the application root.
pub const LOG_FILE: &str = ".gitplugins.log";

/// Commented configuration skeleton emitted by `gen-config`.
pub const CONFIG_SAMPLE: &str = r#"# gitplugins configuration
#
# [settings]
# verbosity = 1   # 0, 1 or 2 ; how much captured git output is echoed
# log = false     # false, true, or an absolute path for the logfile

[settings]
verbosity = 1
log = false

# One [plugins."..."] table per plugin. The quoted key is a label or
# identifier for the plugin, e.g. "local/mailtest".
#
# [plugins."PLUGIN/NAME"]
# path = ""           # mandatory ; path from the application root
# gitrepository = ""  # mandatory
# gitbranch = ""      # optional ; git branch (incompatible with gitrevision)
# gitrevision = ""    # optional ; git revision, hash or tag (incompatible with gitbranch)

# Example plugin:
# [plugins."local/mailtest"]
# path = "/local/mailtest"
# gitrepository = "https://github.com/michael-milette/moodle-local_mailtest"
"#;

/// Startup failures; all of them terminate the invocation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("You must define an environment variable {ROOT_ENV}, pointing at the application root")]
    RootNotSet,

    #[error("Application root must exist and be a directory: {0}")]
    RootInvalid(PathBuf),

    #[error("Config file must exist and be readable: {0}")]
    Unreadable(PathBuf),

    #[error("Invalid config file {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Raw declared attributes of one plugin, as written in the config file.
/// Empty strings count as absent, matching the commented skeleton.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub gitrepository: String,
    #[serde(default)]
    pub gitbranch: Option<String>,
    #[serde(default)]
    pub gitrevision: Option<String>,
}

/// `settings.log`: disabled, enabled with the default path, or an explicit path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSetting {
    Disabled,
    DefaultPath,
    Path(PathBuf),
}

/// Global `[settings]` section.
#[derive(Debug, Clone)]
pub struct Settings {
    pub verbosity: u8,
    pub log: LogSetting,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            verbosity: 0,
            log: LogSetting::Disabled,
        }
    }
}

impl Settings {
    /// Resolve the operation log file, if logging is enabled.
    pub fn logfile(&self, root: &Path) -> Option<PathBuf> {
        match &self.log {
            LogSetting::Disabled => None,
            LogSetting::DefaultPath => Some(root.join(LOG_FILE)),
            LogSetting::Path(path) => Some(path.clone()),
        }
    }
}

/// Parsed configuration: global settings plus the plugin declarations in
/// their original order.
#[derive(Debug, Clone)]
pub struct GitpConfig {
    pub settings: Settings,
    pub plugins: Vec<(String, PluginConfig)>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLog {
    Flag(bool),
    Path(String),
}

#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    #[serde(default)]
    verbosity: Option<u8>,
    #[serde(default)]
    log: Option<RawLog>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    settings: RawSettings,
    #[serde(default)]
    plugins: toml::Table,
}

impl GitpConfig {
    /// Load and parse the configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading configuration from {}", path.display());
        let content =
            fs::read_to_string(path).map_err(|_| ConfigError::Unreadable(path.to_path_buf()))?;
        let config = Self::parse(&content).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "Loaded {} plugin declaration(s) from {}",
            config.plugins.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse configuration content, preserving plugin declaration order.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let raw: RawConfig = toml::from_str(content)?;

        let log = match raw.settings.log {
            None | Some(RawLog::Flag(false)) => LogSetting::Disabled,
            Some(RawLog::Flag(true)) => LogSetting::DefaultPath,
            Some(RawLog::Path(path)) => LogSetting::Path(PathBuf::from(path)),
        };
        let settings = Settings {
            verbosity: raw.settings.verbosity.unwrap_or(0),
            log,
        };

        let mut plugins = Vec::with_capacity(raw.plugins.len());
        for (name, value) in raw.plugins {
            let plugin: PluginConfig = value.try_into()?;
            plugins.push((name, plugin));
        }

        Ok(Self { settings, plugins })
    }
}

/// Resolve the application root from the environment. Missing variable or a
/// non-directory path is a fatal startup error.
pub fn resolve_root() -> Result<PathBuf, ConfigError> {
    let value = env::var(ROOT_ENV).map_err(|_| ConfigError::RootNotSet)?;
    let root = PathBuf::from(value);
    if !root.is_dir() {
        return Err(ConfigError::RootInvalid(root));
    }
    root.canonicalize()
        .map_err(|_| ConfigError::RootInvalid(root))
}
