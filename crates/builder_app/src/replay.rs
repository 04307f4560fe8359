use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use builder_engine::{
    export_workspace, ChatMessage, ChatScope, ChatSession, QueryError, QueryExecutor,
    QueryOutcome, RunnableAction, WorkbenchSnapshot,
};
use builder_logging::{builder_debug, builder_info};
use serde::Serialize;

use crate::settings::ReplaySettings;

/// Accepts every query and returns no rows.
pub(crate) struct DryRunExecutor;

#[async_trait]
impl QueryExecutor for DryRunExecutor {
    async fn execute(&self, scope: &ChatScope, query: &str) -> Result<QueryOutcome, QueryError> {
        builder_info!("dry run for chat {}: {}", scope.chat_id, query);
        Ok(QueryOutcome::default())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ReplayReport {
    pub generated_utc: String,
    pub message_id: String,
    pub chunks: usize,
    pub rendered: String,
    pub settled: bool,
    pub runnable: Vec<RunnableAction>,
    pub workbench: WorkbenchSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported: Option<Vec<PathBuf>>,
}

/// Byte offsets at which the growing buffer is cut, always on char
/// boundaries and always ending with the full length.
fn chunk_ends(text: &str, chunk_chars: usize) -> Vec<usize> {
    let step = chunk_chars.max(1);
    let mut ends: Vec<usize> = text
        .char_indices()
        .map(|(idx, _)| idx)
        .skip(step)
        .step_by(step)
        .collect();
    ends.push(text.len());
    ends
}

/// Feed `transcript` to a fresh session in growing prefixes, writing each
/// rendered delta to `out` as it appears.
pub(crate) fn replay(
    transcript: &str,
    message_id: &str,
    settings: &ReplaySettings,
    export_dir: Option<&Path>,
    out: &mut impl Write,
) -> anyhow::Result<ReplayReport> {
    let mut session = ChatSession::with_options(settings.parser_options());
    if settings.dry_run_sql {
        session.context().set_user_id("replay");
        session.context().set_chat_id(message_id);
        session
            .context()
            .set_query_executor(Arc::new(DryRunExecutor));
    }

    let ends = chunk_ends(transcript, settings.chunk_chars);
    let mut printed = 0;
    for &end in &ends {
        let message = ChatMessage::assistant(message_id, &transcript[..end]);
        session.parse_messages(std::slice::from_ref(&message));
        printed = print_delta(&session, printed, out)?;
        session.workbench_mut().poll_events();
    }
    let message = ChatMessage::assistant(message_id, transcript);
    session.finish_message(0, &message);
    print_delta(&session, printed, out)?;
    writeln!(out).context("failed to write rendered text")?;
    builder_debug!("replayed {} chunks", ends.len());

    let timeout = Duration::from_millis(settings.settle_timeout_ms);
    let settled = session.workbench_mut().settle(timeout);
    let runnable = session.workbench_mut().take_runnable();

    let exported = match export_dir {
        Some(dir) => {
            let summary = export_workspace(dir, session.workbench().files())
                .with_context(|| format!("failed to export workspace to {}", dir.display()))?;
            Some(summary.written)
        }
        None => None,
    };

    Ok(ReplayReport {
        generated_utc: chrono::Utc::now().to_rfc3339(),
        message_id: message_id.to_string(),
        chunks: ends.len(),
        rendered: session.rendered(0).unwrap_or_default().to_string(),
        settled,
        runnable,
        workbench: session.workbench().snapshot(),
        exported,
    })
}

fn print_delta(session: &ChatSession, printed: usize, out: &mut impl Write) -> anyhow::Result<usize> {
    let rendered = session.rendered(0).unwrap_or_default();
    if let Some(delta) = rendered.get(printed..) {
        if !delta.is_empty() {
            write!(out, "{delta}").context("failed to write rendered text")?;
            out.flush().context("failed to flush output")?;
        }
    }
    Ok(rendered.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use builder_engine::{ActionStatus, RunRequest};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const TRANSCRIPT: &str = concat!(
        "Setting up café <3\n",
        r#"<boltArtifact id="shop" title="Shop">"#,
        r#"<boltAction type="file" filePath="src/index.js">console.log("é");</boltAction>"#,
        r#"<boltAction type="shell">npm install</boltAction>"#,
        r#"<boltAction type="supabase" subType="sql">{"sql":"create table items (id int);"}</boltAction>"#,
        "</boltArtifact>\nAll done <",
    );

    #[test]
    fn chunk_ends_respect_char_boundaries() {
        let text = "aé€b";
        let ends = chunk_ends(text, 1);
        assert_eq!(ends, vec![1, 3, 6, 7]);
        assert!(ends.iter().all(|&end| text.is_char_boundary(end)));
        assert_eq!(chunk_ends("", 4), vec![0]);
    }

    #[test]
    fn replay_prints_prose_and_settles_queries() {
        let settings = ReplaySettings {
            chunk_chars: 7,
            dry_run_sql: true,
            ..ReplaySettings::default()
        };
        let mut out = Vec::new();
        let report = replay(TRANSCRIPT, "m1", &settings, None, &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed, "Setting up café <3\n\nAll done <\n");
        assert_eq!(report.rendered, "Setting up café <3\n\nAll done <");
        assert!(report.settled);
        assert_eq!(
            report
                .runnable
                .iter()
                .map(|r| r.request.clone())
                .collect::<Vec<_>>(),
            vec![RunRequest::Shell {
                command: "npm install".to_string()
            }]
        );

        let sql = &report.workbench.artifacts[0].records[2];
        assert_eq!(sql.status, ActionStatus::Complete);
        assert_eq!(report.workbench.files[0].path, "src/index.js");

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["generated_utc"].as_str().is_some());
        assert!(json.get("exported").is_none());
    }

    #[test]
    fn sql_without_dry_run_has_no_project() {
        let mut out = Vec::new();
        let report = replay(TRANSCRIPT, "m1", &ReplaySettings::default(), None, &mut out).unwrap();

        let sql = &report.workbench.artifacts[0].records[2];
        assert_eq!(sql.status, ActionStatus::failed("no connected project"));
    }

    #[test]
    fn replay_exports_workspace_files() {
        let temp = TempDir::new().unwrap();
        let out_dir = temp.path().join("site");
        let mut out = Vec::new();
        let report = replay(
            TRANSCRIPT,
            "m1",
            &ReplaySettings::default(),
            Some(&out_dir),
            &mut out,
        )
        .unwrap();

        assert_eq!(report.exported.map(|paths| paths.len()), Some(1));
        assert_eq!(
            std::fs::read_to_string(out_dir.join("src").join("index.js")).unwrap(),
            r#"console.log("é");"#
        );
    }
}
