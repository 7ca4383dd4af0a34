mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use persist_dl::commands;
use persist_dl::config::Settings;
use persist_dl::downloader::Outcome;
use persist_dl::logging;
use std::process::ExitCode;

use crate::cli::Args;

/// Exit status for an operator-requested stop, matching SIGINT convention.
const EXIT_STOPPED: u8 = 130;

fn main() -> Result<ExitCode> {
    let mut args = Args::parse();
    logging::init(args.verbose);

    let mut settings = Settings::load(args.config.as_deref()).context("Failed to load config")?;
    args.apply(&mut settings);
    settings.validate()?;

    // Output dir might not exist yet, so we resolve it relative to current dir
    if args.download_dir.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            args.download_dir = cwd.join(&args.download_dir);
        }
    }

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(commands::run_single_download(
        args.url,
        args.download_dir,
        settings,
        !args.no_monitor,
    ))?;

    Ok(match outcome {
        Outcome::Completed => ExitCode::SUCCESS,
        Outcome::Stopped => ExitCode::from(EXIT_STOPPED),
        Outcome::Failed(_) => ExitCode::FAILURE,
    })
}
