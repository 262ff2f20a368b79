//! CLI module for Docweave
//!
//! Provides subcommands operating on a JSON workflow definition:
//! - `run`: execute the workflow once and report the outcome
//! - `check`: run only the pre-flight check

pub mod check;
pub mod definition;
pub mod run;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Docweave - document generation workflows
#[derive(Parser)]
#[command(name = "docweave")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a workflow definition to completion
    Run(run::RunArgs),

    /// Check a workflow definition without running it
    Check(check::CheckArgs),
}

/// Definition file and run-time uploads shared by every subcommand
#[derive(Args, Clone, Debug)]
pub struct DefinitionArgs {
    /// Workflow definition (JSON)
    pub definition: PathBuf,

    /// Uploaded file for a source or outcome, as `name=path`
    #[arg(long = "upload", value_parser = parse_key_value)]
    pub uploads: Vec<(String, String)>,
}

/// Parse a `key=value` argument
pub fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", arg))
}

/// Load `.env`, configuration and logging
fn init() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);
    config
}
