use std::fs;
use std::path::Path;

use builder_core::ParserOptions;
use builder_logging::{builder_info, builder_warn};
use serde::{Deserialize, Serialize};

pub(crate) const SETTINGS_FILENAME: &str = "builder_replay.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ReplaySettings {
    /// Characters added to the buffer per parse call.
    pub chunk_chars: usize,
    pub emit_artifact_placeholder: bool,
    pub stream_all_actions: bool,
    /// Answer SQL actions with an executor that only logs the query.
    pub dry_run_sql: bool,
    pub settle_timeout_ms: u64,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            chunk_chars: 24,
            emit_artifact_placeholder: false,
            stream_all_actions: false,
            dry_run_sql: false,
            settle_timeout_ms: 5_000,
        }
    }
}

impl ReplaySettings {
    pub(crate) fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            emit_artifact_placeholder: self.emit_artifact_placeholder,
            stream_all_actions: self.stream_all_actions,
        }
    }
}

/// Missing file gives defaults; unreadable or invalid content is logged and
/// also gives defaults.
pub(crate) fn load_settings(path: &Path) -> ReplaySettings {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return ReplaySettings::default();
        }
        Err(err) => {
            builder_warn!("Failed to read settings from {:?}: {}", path, err);
            return ReplaySettings::default();
        }
    };

    match ron::from_str::<ReplaySettings>(&content) {
        Ok(settings) => {
            builder_info!("Loaded replay settings from {:?}", path);
            settings
        }
        Err(err) => {
            builder_warn!("Failed to parse settings from {:?}: {}", path, err);
            ReplaySettings::default()
        }
    }
}
