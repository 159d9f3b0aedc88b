mod api;
mod config;
mod console;
mod error;
mod terminal;
mod web;

#[cfg(test)]
mod testutil;

use std::env;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::ConsoleConfig;
use console::{
    BackupConsole,
    confirm::{AutoConfirm, Confirm, TerminalConfirm},
};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    if let Err(err) = app_main().await {
        error!(?err, "application error");
        std::process::exit(1);
    }
}

async fn app_main() -> Result<()> {
    let config = ConsoleConfig::from_env()?;
    let assume_yes = env::args().skip(1).any(|arg| arg == "--yes" || arg == "-y");

    let confirm: Box<dyn Confirm> = if assume_yes {
        Box::new(AutoConfirm(true))
    } else {
        Box::new(TerminalConfirm)
    };

    info!(base_url = %config.base_url, page_size = config.page_size, "starting backup console");
    let console = BackupConsole::new(&config, confirm).context("failed to build backup client")?;

    terminal::run(console, config.snapshot_path.clone()).await
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
