mod cli;
mod logging;
mod replay;
mod settings;

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use builder_logging::builder_info;
use clap::Parser;

use crate::cli::Cli;
use crate::settings::{load_settings, SETTINGS_FILENAME};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log, cli.verbose);

    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILENAME));
    let settings = cli.apply_to(load_settings(&settings_path));
    builder_info!("Replaying {:?} with {:?}", cli.transcript, settings);

    let transcript = fs::read_to_string(&cli.transcript)
        .with_context(|| format!("failed to read transcript {}", cli.transcript.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let report = replay::replay(
        &transcript,
        &cli.message_id,
        &settings,
        cli.export.as_deref(),
        &mut out,
    )?;

    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    writeln!(out, "{json}").context("failed to write report")?;
    Ok(())
}
