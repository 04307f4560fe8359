use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::files::WorkspaceFiles;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabasePayloadError {
    #[error("empty payload")]
    EmptyPayload,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),
    #[error("JSON payload has no \"sql\" string")]
    MissingSql,
}

/// Where the SQL text of a `sql` action came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum SqlSource {
    Inline,
    Json,
    MigrationFile(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketAction {
    Create,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRequest {
    pub action: BucketAction,
    pub bucket: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum DatabaseOperation {
    Sql { query: String, source: SqlSource },
    Storage(StorageRequest),
    /// Subtype this build does not interpret; handed to the host as is.
    Other { subtype: String, payload: String },
}

#[derive(Deserialize)]
struct SqlEnvelope {
    sql: Option<String>,
}

impl DatabaseOperation {
    /// Interpret the closed content of a database action.
    ///
    /// `sql` payloads are either a JSON object with an `sql` field, a path to
    /// a migration file already written to `files`, or the SQL itself.
    pub fn parse(
        subtype: &str,
        payload: &str,
        files: &WorkspaceFiles,
    ) -> Result<Self, DatabasePayloadError> {
        let payload = payload.trim();
        match subtype {
            "sql" => parse_sql(payload, files),
            "storage" => {
                if payload.is_empty() {
                    return Err(DatabasePayloadError::EmptyPayload);
                }
                let request: StorageRequest = serde_json::from_str(payload)
                    .map_err(|err| DatabasePayloadError::InvalidJson(err.to_string()))?;
                Ok(DatabaseOperation::Storage(request))
            }
            other => Ok(DatabaseOperation::Other {
                subtype: other.to_string(),
                payload: payload.to_string(),
            }),
        }
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            DatabaseOperation::Sql { query, .. } => Some(query),
            _ => None,
        }
    }
}

fn parse_sql(payload: &str, files: &WorkspaceFiles) -> Result<DatabaseOperation, DatabasePayloadError> {
    if payload.is_empty() {
        return Err(DatabasePayloadError::EmptyPayload);
    }

    if payload.starts_with('{') {
        let envelope: SqlEnvelope = serde_json::from_str(payload)
            .map_err(|err| DatabasePayloadError::InvalidJson(err.to_string()))?;
        let query = envelope
            .sql
            .filter(|sql| !sql.trim().is_empty())
            .ok_or(DatabasePayloadError::MissingSql)?;
        return Ok(DatabaseOperation::Sql {
            query,
            source: SqlSource::Json,
        });
    }

    if !payload.contains(char::is_whitespace) {
        if let Some(content) = files.file_content(payload) {
            return Ok(DatabaseOperation::Sql {
                query: content.to_string(),
                source: SqlSource::MigrationFile(payload.to_string()),
            });
        }
    }

    Ok(DatabaseOperation::Sql {
        query: payload.to_string(),
        source: SqlSource::Inline,
    })
}
