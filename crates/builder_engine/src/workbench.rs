use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use builder_core::{
    ActionCallbackData, ActionKind, ArtifactCallbackData, ParsedAction, ParserCallbacks,
};
use builder_logging::{builder_debug, builder_info, builder_warn};
use serde::Serialize;

use crate::context::SessionContext;
use crate::database::{DatabaseOperation, StorageRequest};
use crate::engine::QueryDispatcher;
use crate::executor::{QueryError, QueryOutcome};
use crate::files::{content_digest, WorkspaceFiles};
use crate::{ActionKey, ActionStatus, EngineEvent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRecord {
    pub message_id: String,
    pub id: String,
    pub title: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    pub closed: bool,
    /// Actions in the order they were registered.
    pub actions: Vec<ActionKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub key: ActionKey,
    pub artifact_id: String,
    #[serde(flatten)]
    pub action: ParsedAction,
    #[serde(flatten)]
    pub status: ActionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<DatabaseOperation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<QueryOutcome>,
}

/// Work the host has to carry out itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "run", rename_all = "snake_case")]
pub enum RunRequest {
    Shell { command: String },
    Start { command: String },
    Deploy,
    Storage(StorageRequest),
    Database { subtype: String, payload: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunnableAction {
    pub key: ActionKey,
    pub artifact_id: String,
    pub request: RunRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSnapshot {
    pub path: String,
    pub bytes: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSnapshot {
    #[serde(flatten)]
    pub artifact: ArtifactRecord,
    #[serde(rename = "action_records")]
    pub records: Vec<ActionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkbenchSnapshot {
    pub show_workbench: bool,
    pub artifacts: Vec<ArtifactSnapshot>,
    pub files: Vec<FileSnapshot>,
    pub pending_queries: usize,
}

/// Applies parser events to an in-memory project: files are written as they
/// stream, commands are queued for the host, SQL is sent to the executor.
pub struct Workbench {
    context: SessionContext,
    dispatcher: Option<QueryDispatcher>,
    show_workbench: bool,
    artifact_order: Vec<String>,
    artifacts: BTreeMap<String, ArtifactRecord>,
    actions: BTreeMap<ActionKey, ActionRecord>,
    files: WorkspaceFiles,
    runnable: VecDeque<RunnableAction>,
    in_flight: usize,
}

impl Workbench {
    pub fn new(context: SessionContext) -> Self {
        Self {
            context,
            dispatcher: None,
            show_workbench: false,
            artifact_order: Vec::new(),
            artifacts: BTreeMap::new(),
            actions: BTreeMap::new(),
            files: WorkspaceFiles::new(),
            runnable: VecDeque::new(),
            in_flight: 0,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn show_workbench(&self) -> bool {
        self.show_workbench
    }

    pub fn artifact(&self, id: &str) -> Option<&ArtifactRecord> {
        self.artifacts.get(id)
    }

    /// Artifacts in the order they were first opened.
    pub fn artifacts(&self) -> impl Iterator<Item = &ArtifactRecord> {
        self.artifact_order
            .iter()
            .filter_map(|id| self.artifacts.get(id))
    }

    pub fn action(&self, key: &ActionKey) -> Option<&ActionRecord> {
        self.actions.get(key)
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionRecord> {
        self.actions.values()
    }

    pub fn files(&self) -> &WorkspaceFiles {
        &self.files
    }

    /// Queries submitted whose result has not been applied yet.
    pub fn pending_queries(&self) -> usize {
        self.in_flight
    }

    /// Drain the actions waiting for the host, oldest first.
    pub fn take_runnable(&mut self) -> Vec<RunnableAction> {
        self.runnable.drain(..).collect()
    }

    /// Record the result of work the host ran. Returns whether the action exists.
    pub fn mark_action(&mut self, key: &ActionKey, status: ActionStatus) -> bool {
        match self.actions.get_mut(key) {
            Some(record) => {
                builder_debug!("Workbench: {key} -> {status:?}");
                record.status = status;
                true
            }
            None => false,
        }
    }

    /// Apply query results that have already arrived. Returns how many.
    pub fn poll_events(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.dispatcher.as_ref().and_then(QueryDispatcher::try_recv) {
            self.apply_event(event);
            applied += 1;
        }
        applied
    }

    /// Wait up to `timeout` for every in-flight query. Returns whether none
    /// are left.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.poll_events();
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let event = match self.dispatcher.as_ref() {
                Some(dispatcher) => dispatcher.recv_timeout(remaining),
                None => None,
            };
            match event {
                Some(event) => self.apply_event(event),
                None => break,
            }
        }
        if self.in_flight > 0 {
            builder_warn!("Workbench: {} queries still running", self.in_flight);
        }
        self.in_flight == 0
    }

    pub fn snapshot(&self) -> WorkbenchSnapshot {
        let artifacts = self
            .artifacts()
            .map(|artifact| ArtifactSnapshot {
                artifact: artifact.clone(),
                records: artifact
                    .actions
                    .iter()
                    .filter_map(|key| self.actions.get(key).cloned())
                    .collect(),
            })
            .collect();
        let files = self
            .files
            .files()
            .map(|(path, content)| FileSnapshot {
                path: path.to_string(),
                bytes: content.len(),
                sha256: content_digest(content),
            })
            .collect();
        WorkbenchSnapshot {
            show_workbench: self.show_workbench,
            artifacts,
            files,
            pending_queries: self.in_flight,
        }
    }

    fn apply_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::QueryFinished { key, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let Some(record) = self.actions.get_mut(&key) else {
                    builder_warn!("Workbench: result for unknown action {key}");
                    return;
                };
                match result {
                    Ok(outcome) => {
                        builder_info!("Workbench: query {key} returned {} rows", outcome.rows.len());
                        record.status = ActionStatus::Complete;
                        record.outcome = Some(outcome);
                    }
                    Err(err) => {
                        builder_warn!("Workbench: query {key} failed: {err}");
                        record.status = ActionStatus::failed(err.to_string());
                    }
                }
            }
        }
    }

    fn register(&mut self, data: &ActionCallbackData, status: ActionStatus) -> ActionKey {
        let key = ActionKey::new(&data.message_id, data.action_index);
        if let Some(artifact) = self.artifacts.get_mut(&data.artifact_id) {
            if !artifact.actions.contains(&key) {
                artifact.actions.push(key.clone());
            }
        }
        self.actions.insert(
            key.clone(),
            ActionRecord {
                key: key.clone(),
                artifact_id: data.artifact_id.clone(),
                action: data.action.clone(),
                status,
                operation: None,
                outcome: None,
            },
        );
        key
    }

    fn write_file(&mut self, data: &ActionCallbackData, path: &str, finished: bool) {
        let key = ActionKey::new(&data.message_id, data.action_index);
        if !self.actions.contains_key(&key) {
            self.register(data, ActionStatus::Pending);
        }
        let result = self.files.write_file(path, &data.action.content);
        let Some(record) = self.actions.get_mut(&key) else {
            return;
        };
        if matches!(record.status, ActionStatus::Failed { .. }) {
            return;
        }
        record.action.content.clone_from(&data.action.content);
        match result {
            Ok(_) if finished => record.status = ActionStatus::Complete,
            Ok(_) => record.status = ActionStatus::Running,
            Err(err) => {
                builder_warn!("Workbench: cannot write {path:?} for {key}: {err}");
                record.status = ActionStatus::failed(err.to_string());
            }
        }
    }

    fn queue(&mut self, key: ActionKey, artifact_id: &str, request: RunRequest) {
        builder_debug!("Workbench: queued {key}");
        self.runnable.push_back(RunnableAction {
            key,
            artifact_id: artifact_id.to_string(),
            request,
        });
    }

    fn close_database(&mut self, data: &ActionCallbackData, subtype: &str) {
        let key = self.register(data, ActionStatus::Pending);
        let operation = match DatabaseOperation::parse(subtype, &data.action.content, &self.files) {
            Ok(operation) => operation,
            Err(err) => {
                builder_warn!("Workbench: bad {subtype} payload in {key}: {err}");
                self.mark_action(&key, ActionStatus::failed(err.to_string()));
                return;
            }
        };

        let status = match &operation {
            DatabaseOperation::Sql { query, .. } => self.dispatch_query(&key, query),
            DatabaseOperation::Storage(request) => {
                self.queue(key.clone(), &data.artifact_id, RunRequest::Storage(request.clone()));
                ActionStatus::Queued
            }
            DatabaseOperation::Other { subtype, payload } => {
                self.queue(
                    key.clone(),
                    &data.artifact_id,
                    RunRequest::Database {
                        subtype: subtype.clone(),
                        payload: payload.clone(),
                    },
                );
                ActionStatus::Queued
            }
        };
        if let Some(record) = self.actions.get_mut(&key) {
            record.status = status;
            record.operation = Some(operation);
        }
    }

    fn dispatch_query(&mut self, key: &ActionKey, query: &str) -> ActionStatus {
        let (Some(scope), Some(executor)) = (self.context.scope(), self.context.query_executor())
        else {
            builder_warn!("Workbench: cannot run {key}: {}", QueryError::NoConnectedProject);
            return ActionStatus::failed(QueryError::NoConnectedProject.to_string());
        };
        self.dispatcher
            .get_or_insert_with(QueryDispatcher::new)
            .submit(key.clone(), scope, query, executor);
        self.in_flight += 1;
        ActionStatus::Running
    }
}

impl ParserCallbacks for Workbench {
    fn on_artifact_open(&mut self, data: &ArtifactCallbackData) {
        self.show_workbench = true;
        let id = data.artifact.id.clone();
        if self.artifacts.contains_key(&id) {
            builder_debug!("Workbench: artifact {id:?} reopened by {}", data.message_id);
            return;
        }
        self.artifact_order.push(id.clone());
        self.artifacts.insert(
            id.clone(),
            ArtifactRecord {
                message_id: data.message_id.clone(),
                id,
                title: data.artifact.title.clone(),
                artifact_type: data.artifact.artifact_type.clone(),
                closed: false,
                actions: Vec::new(),
            },
        );
    }

    fn on_artifact_close(&mut self, data: &ArtifactCallbackData) {
        if let Some(artifact) = self.artifacts.get_mut(&data.artifact.id) {
            artifact.closed = true;
        }
    }

    fn on_action_open(&mut self, data: &ActionCallbackData) {
        if data.action.kind.is_file() {
            self.register(data, ActionStatus::Pending);
        }
    }

    fn on_action_stream(&mut self, data: &ActionCallbackData) {
        if let ActionKind::File { path } = &data.action.kind {
            self.write_file(data, path, false);
        }
    }

    fn on_action_close(&mut self, data: &ActionCallbackData) {
        let content = data.action.content.clone();
        match &data.action.kind {
            ActionKind::File { path } => self.write_file(data, path, true),
            ActionKind::Shell => {
                let key = self.register(data, ActionStatus::Queued);
                self.queue(key, &data.artifact_id, RunRequest::Shell { command: content });
            }
            ActionKind::Start => {
                let key = self.register(data, ActionStatus::Queued);
                self.queue(key, &data.artifact_id, RunRequest::Start { command: content });
            }
            ActionKind::Deploy => {
                let key = self.register(data, ActionStatus::Queued);
                self.queue(key, &data.artifact_id, RunRequest::Deploy);
            }
            ActionKind::Database { subtype } => self.close_database(data, subtype),
            ActionKind::Generic { declared } => {
                builder_debug!("Workbench: nothing to run for action type {declared:?}");
                self.register(data, ActionStatus::Complete);
            }
        }
    }
}
