pub mod cli;
pub mod collection;
pub mod config;
pub mod display;
pub mod git;
pub mod logging;
pub mod plugin;
