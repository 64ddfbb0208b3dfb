use anyhow::Result;
use clap::{Parser, Subcommand};
use log::debug;
use std::path::PathBuf;

/// Plugin installation or upgrade via Git, as declared in .gitplugins.toml
#[derive(Parser, Debug)]
#[command(name = "gitplugins")]
#[command(about = "Plugin installation or upgrade via Git, as declared in .gitplugins.toml")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Read this configuration file instead of <root>/.gitplugins.toml
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// No formatting sequences (compatibility with exotic terminals)
    #[arg(long, global = true)]
    pub ascii: bool,

    /// Verbose diagnostics (debug level logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet diagnostics (error level logging only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Diagnostics log format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    pub log_format: String,

    /// Diagnostics log file (in addition to the console)
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all declared plugins (without diagnostic)
    List,
    /// Diagnostic of all declared plugins
    Diag,
    /// Display details about one plugin
    Detail { name: String },
    /// Git status on each declared plugin
    StatusAll,
    /// Check the consistency of the configuration file
    CheckConfig,
    /// Install all plugins that are not already present
    InstallAll,
    /// Install this plugin according to the configuration
    Install { name: String },
    /// Upgrade all plugins already installed
    UpgradeAll,
    /// Upgrade this plugin according to the configuration
    Upgrade { name: String },
    /// Rename all plugins in an inconsistent state so restoration is possible
    Cleanup,
    /// Generate a chunk of lines to insert in your .git/info/exclude file
    GenExclude,
    /// Generate a sample configuration file
    GenConfig,
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    let args = Args::parse();
    debug!("Parsed CLI arguments: {:?}", args);
    args
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    if args.verbose && args.quiet {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose or --quiet may be specified"
        ));
    }

    match args.log_format.to_lowercase().as_str() {
        "text" | "json" => {}
        _ => {
            return Err(anyhow::anyhow!(
                "Invalid log format '{}'. Valid options: text, json",
                args.log_format
            ))
        }
    }

    Ok(())
}
