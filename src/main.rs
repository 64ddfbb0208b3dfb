use anyhow::Result;
use log::{error, LevelFilter};
use std::process;
use std::str::FromStr;

use gitplugins::cli::{self, Args, Command};
use gitplugins::collection::{self, Collection};
use gitplugins::config::{self, GitpConfig, CONFIG_FILE};
use gitplugins::logging::{self, LogConfig, LogDestination, LogFormat};
use gitplugins::plugin::RETURN_OK;

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let args = cli::parse_args();
    cli::validate_args(&args)?;
    logging::init_logger(configure_logging(&args)?)?;

    let root = config::resolve_root()?;

    // gen-config runs before loading: the config file may not exist yet
    if let Command::GenConfig = args.command {
        return collection::generate_config(&root);
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| root.join(CONFIG_FILE));
    let config = GitpConfig::load(&config_path)?;

    let mut plugins = Collection::new(root, config, args.ascii);
    plugins.set_diagnostic()?;

    match &args.command {
        Command::List => Ok(plugins.list()),
        Command::Diag => Ok(plugins.display_diagnostic()),
        Command::Detail { name } => plugins.detail(name),
        Command::StatusAll => plugins.status_all(),
        Command::CheckConfig => plugins.check_config(),
        Command::InstallAll => plugins.install_all(),
        Command::Install { name } => plugins.install(name),
        Command::UpgradeAll => plugins.upgrade_all(),
        Command::Upgrade { name } => plugins.upgrade(name),
        Command::Cleanup => Ok(plugins.cleanup()),
        Command::GenExclude => {
            println!("You can insert the following lines in the file `.git/info/exclude`");
            println!();
            println!("{}", plugins.generate_exclude());
            Ok(RETURN_OK)
        }
        Command::GenConfig => unreachable!("handled before configuration load"),
    }
}

fn configure_logging(args: &Args) -> Result<LogConfig> {
    let level = if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    };

    let format = LogFormat::from_str(&args.log_format).map_err(|e| anyhow::anyhow!(e))?;

    let destination = match &args.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Console,
    };

    Ok(LogConfig {
        level,
        format,
        destination,
    })
}
