//! wpyc - incremental build tool for `.wpy` mini program pages.

mod build;
mod cli;
mod compiler;
mod config;
mod logger;
mod utils;
mod watch;

use anyhow::{Context, Result};
use build::build;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use compiler::Session;
use config::ProjectConfig;
use std::env;
use watch::watch;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    match cli.command {
        Some(Commands::Build) => run_build(cli.watch),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

/// Full build, then an optional watch session.
fn run_build(watch_mode: bool) -> Result<()> {
    let session = load_session()?;
    build(&session);

    if watch_mode {
        ctrlc::set_handler(|| {
            log!("watch"; "stopped");
            std::process::exit(0);
        })
        .context("Failed to set Ctrl+C handler")?;
        watch(&session)?;
    }

    Ok(())
}

/// Load and validate `wpy.toml` from the working directory.
fn load_session() -> Result<Session> {
    let root = env::current_dir().context("Failed to read current directory")?;
    let config = ProjectConfig::load(&root)?;
    config.validate()?;
    Ok(Session::new(config))
}
