//! Collection orchestration
//!
//! Builds one [`PluginRecord`] per configuration entry, preserving the
//! declaration order, and dispatches the selected operation across all or
//! one plugin, sequentially, aggregating per-plugin results. Diagnosis is
//! always refreshed for the whole collection before any operation runs.

use anyhow::{bail, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{GitpConfig, CONFIG_FILE, CONFIG_SAMPLE, LOG_FILE};
use crate::display::{Echo, Style};
use crate::plugin::{Diagnosis, PluginRecord, RETURN_ERROR, RETURN_OK};

pub struct Collection {
    plugins: Vec<PluginRecord>,
    echo: Echo,
    style: Style,
}

impl Collection {
    /// Build the plugin records from the loaded configuration, in
    /// declaration order.
    pub fn new(root: PathBuf, config: GitpConfig, ascii: bool) -> Self {
        let echo = Echo::new(
            config.settings.verbosity,
            config.settings.logfile(&root),
        );
        let plugins = config
            .plugins
            .into_iter()
            .map(|(name, declared)| PluginRecord::new(&name, declared, &root))
            .collect();
        Self {
            plugins,
            echo,
            style: Style::new(ascii),
        }
    }

    pub fn plugins(&self) -> &[PluginRecord] {
        &self.plugins
    }

    /// Refresh the diagnosis of every plugin. Runs before any operation so
    /// that preconditions observe the current filesystem state.
    pub fn set_diagnostic(&mut self) -> Result<()> {
        for plugin in &mut self.plugins {
            plugin.set_diagnostic()?;
        }
        Ok(())
    }

    /// Group the plugins under the five diagnosis headings.
    pub fn display_diagnostic(&self) -> i32 {
        for diagnosis in Diagnosis::ALL {
            println!("{} : ", diagnosis.message());
            for plugin in &self.plugins {
                if plugin.diagnosis == Some(diagnosis) {
                    println!("    * {} : {}", plugin.name, plugin.path);
                }
            }
            println!();
        }
        RETURN_OK
    }

    /// Indexed table of the declared plugins, without diagnostics.
    pub fn list(&self) -> i32 {
        for (i, plugin) in self.plugins.iter().enumerate() {
            println!(
                "{:3}. {:<25} {:<40} {:<10} {:<10}",
                i + 1,
                plugin.name,
                plugin.path,
                plugin.revision.as_deref().unwrap_or(""),
                plugin.branch.as_deref().unwrap_or("")
            );
        }
        RETURN_OK
    }

    pub fn detail(&self, name: &str) -> Result<i32> {
        let plugin = self.find_plugin(name)?;
        println!("\n{}...", self.style.bold(&plugin.name));
        plugin.detail(&self.echo)
    }

    /// Advisory consistency checks over every declaration; alerts never
    /// abort the run.
    pub fn check_config(&self) -> Result<i32> {
        for plugin in &self.plugins {
            println!("\n{}... ", self.style.bold(&plugin.name));
            let alerts = plugin.check_config()?;
            if alerts.is_empty() {
                println!("OK.");
            } else {
                println!("{}", alerts.join("\n"));
            }
        }
        Ok(RETURN_OK)
    }

    /// `git status` on each plugin, partitioning the names into OK/errors
    /// and tallying short-status codes for plugins with local modifications.
    pub fn status_all(&self) -> Result<i32> {
        let mut ok = Vec::new();
        let mut errors = Vec::new();
        let mut modified = Vec::new();

        for plugin in &self.plugins {
            println!("\n{}...", self.style.invert(&plugin.name));
            let (code, tally) = plugin.status(&self.echo)?;
            if code == 0 {
                ok.push(plugin.name.clone());
            } else {
                errors.push(plugin.name.clone());
            }
            if !tally.is_empty() {
                modified.push((plugin.name.clone(), tally));
            }
        }

        if !ok.is_empty() {
            println!("\n\n{}{}", self.style.invert("Status OK :"), ok.join(" "));
        }
        if !errors.is_empty() {
            println!(
                "\n\n{}{}",
                self.style.invert("Status errors :"),
                errors.join(" ")
            );
        }
        println!("\n");
        if !modified.is_empty() {
            println!("According to git status, there are local modification:");
            for (name, tally) in &modified {
                let counts: Vec<String> = tally
                    .iter()
                    .map(|(code, count)| format!("{}={}", code, count))
                    .collect();
                println!("{} : {}", name, counts.join(", "));
            }
        }

        Ok(if errors.is_empty() { RETURN_OK } else { RETURN_ERROR })
    }

    pub fn install_all(&self) -> Result<i32> {
        let mut result = RETURN_OK;
        for plugin in &self.plugins {
            println!("\n{}...", self.style.bold(&plugin.name));
            self.echo.log_entry(&plugin.name);
            if plugin.install(&self.echo)? != 0 {
                result = RETURN_ERROR;
            }
        }
        Ok(result)
    }

    pub fn install(&self, name: &str) -> Result<i32> {
        let plugin = self.find_plugin(name)?;
        println!("\n{}...", self.style.bold(&plugin.name));
        self.echo.log_entry(&plugin.name);
        plugin.install(&self.echo)
    }

    pub fn upgrade_all(&self) -> Result<i32> {
        let mut result = RETURN_OK;
        for plugin in &self.plugins {
            println!("\n{}...", self.style.bold(&plugin.name));
            self.echo.log_entry(&plugin.name);
            if plugin.upgrade(&self.echo)? != 0 {
                result = RETURN_ERROR;
            }
        }
        Ok(result)
    }

    pub fn upgrade(&self, name: &str) -> Result<i32> {
        let plugin = self.find_plugin(name)?;
        println!("\n{}...", self.style.bold(&plugin.name));
        self.echo.log_entry(&plugin.name);
        plugin.upgrade(&self.echo)
    }

    /// Rename every plugin directory that is not a git checkout; all other
    /// plugins are reported unchanged.
    pub fn cleanup(&self) -> i32 {
        let mut result = RETURN_OK;
        for plugin in &self.plugins {
            println!("\n{}...", self.style.bold(&plugin.name));
            let (code, message) = plugin.cleanup();
            println!("{}", message);
            if code != 0 {
                result = RETURN_ERROR;
            }
        }
        result
    }

    /// Fenced block of ignorable paths for insertion in a version-control
    /// exclude file: housekeeping files plus every OK-diagnosed plugin path.
    /// Empty when no plugin is diagnosed OK.
    pub fn generate_exclude(&self) -> String {
        let excludes: Vec<&str> = self
            .plugins
            .iter()
            .filter(|p| p.diagnosis == Some(Diagnosis::Ok))
            .map(|p| p.path.as_str())
            .collect();
        if excludes.is_empty() {
            return String::new();
        }

        let mut lines = vec![
            "## gitplugins BEGIN autogenerated exclude",
            CONFIG_FILE,
            LOG_FILE,
            "#",
        ];
        lines.extend(excludes);
        lines.push("## gitplugins END");
        let mut block = lines.join("\n");
        block.push('\n');
        block
    }

    fn find_plugin(&self, name: &str) -> Result<&PluginRecord> {
        match self.plugins.iter().find(|p| p.name == name) {
            Some(plugin) => Ok(plugin),
            None => bail!(
                "{} not listed in {}. You can use `gitplugins list`",
                name,
                CONFIG_FILE
            ),
        }
    }
}

/// Write the commented configuration skeleton to `<root>/.gitplugins.toml`,
/// or print it to stdout when the file already exists.
pub fn generate_config(root: &Path) -> Result<i32> {
    let target = root.join(CONFIG_FILE);
    if target.exists() {
        println!("{} already exists ; sample printed below.\n", target.display());
        print!("{}", CONFIG_SAMPLE);
    } else {
        fs::write(&target, CONFIG_SAMPLE)?;
        info!("Wrote configuration sample to {}", target.display());
        println!("Writing {} ; to be completed.", target.display());
    }
    Ok(RETURN_OK)
}
