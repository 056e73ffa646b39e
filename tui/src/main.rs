use std::{fs::OpenOptions, path::Path};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Env, Target};

mod app;
mod config;
mod ui;

fn main() -> Result<()> {
    let args = config::Args::parse();
    init_logging(&args.log_file)?;

    let config = config::load(&args)?;
    app::run::run(config, args.role.is_some())
}

/// Sends logs to `path`, the terminal is taken by the dashboard.
fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();

    Ok(())
}
