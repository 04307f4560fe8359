use std::fmt;

use serde::Serialize;

use crate::executor::{QueryError, QueryOutcome};

/// Identity of an action across the whole session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ActionKey {
    pub message_id: String,
    pub action_index: usize,
}

impl ActionKey {
    pub fn new(message_id: impl Into<String>, action_index: usize) -> Self {
        Self {
            message_id: message_id.into(),
            action_index,
        }
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.message_id, self.action_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionStatus {
    /// Opened, nothing applied yet.
    Pending,
    /// File content is streaming in, or a query is in flight.
    Running,
    /// Waiting for the host to run it (shell, start, deploy, storage, ...).
    Queued,
    Complete,
    Failed { reason: String },
}

impl ActionStatus {
    pub fn failed(reason: impl Into<String>) -> Self {
        ActionStatus::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, ActionStatus::Complete | ActionStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    QueryFinished {
        key: ActionKey,
        result: Result<QueryOutcome, QueryError>,
    },
}
