use std::path::PathBuf;

use clap::Parser;

use crate::logging::LogDestination;
use crate::settings::ReplaySettings;

/// Replay a recorded assistant response through the streaming parser and
/// workbench, chunk by chunk.
#[derive(Debug, Parser)]
#[command(name = "builder-replay", version)]
pub(crate) struct Cli {
    /// Text file holding the full assistant response
    pub transcript: PathBuf,

    /// RON settings file (defaults to ./builder_replay.ron)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Characters appended to the buffer per parse call
    #[arg(long)]
    pub chunk: Option<usize>,

    /// Emit artifact placeholder elements in the rendered text
    #[arg(long)]
    pub placeholder: bool,

    /// Stream every action kind, not only file writes
    #[arg(long)]
    pub stream_all: bool,

    /// Run SQL actions against an executor that only logs them
    #[arg(long)]
    pub dry_run_sql: bool,

    /// Milliseconds to wait for dispatched queries before the snapshot
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Write the resulting workspace files below this directory
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Id the response is parsed under
    #[arg(long, default_value = "replay")]
    pub message_id: String,

    #[arg(long, value_enum, default_value = "terminal")]
    pub log: LogDestination,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Flags given on the command line win over the settings file.
    pub(crate) fn apply_to(&self, mut settings: ReplaySettings) -> ReplaySettings {
        if let Some(chunk) = self.chunk {
            settings.chunk_chars = chunk;
        }
        if let Some(settle_ms) = self.settle_ms {
            settings.settle_timeout_ms = settle_ms;
        }
        settings.emit_artifact_placeholder |= self.placeholder;
        settings.stream_all_actions |= self.stream_all;
        settings.dry_run_sql |= self.dry_run_sql;
        settings
    }
}
