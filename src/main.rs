// src/main.rs

use anyhow::Context;
use clap::Parser;
use log::{error, warn, LevelFilter};
use std::process::ExitCode;

use vidledger::application::{dispatch, exit_status_for, AppState, Cli, ErrorResponse, ExitStatus};
use vidledger::config::AppConfig;
use vidledger::error::AppError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(status) => status.into(),
        Err(err) => {
            let status = match err.downcast_ref::<AppError>() {
                Some(app_error) => {
                    let response = ErrorResponse::from_app_error(app_error);
                    error!("{:#}", err);
                    eprintln!("error: {}", response);
                    exit_status_for(app_error)
                }
                None => {
                    eprintln!("error: {:#}", err);
                    ExitStatus::StartupFailure
                }
            };
            status.into()
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitStatus> {
    // 1. CONFIGURATION
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // 2. LOGGING
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        config.level_filter()?
    };
    let mut clog = colog::default_builder();
    clog.filter(None, level);
    clog.init();

    // 3. DATABASE
    let state = AppState::initialize(config).context("Failed to open the database")?;

    // 4. CTRL-C: stop before the next batch, keep what is committed
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current batch");
            shutdown.cancel();
        }
    });

    // 5. COMMAND
    Ok(dispatch(&state, cli.command).await?)
}
