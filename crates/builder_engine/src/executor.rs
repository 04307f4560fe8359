use serde::Serialize;

/// The user and chat a query runs on behalf of; the executor resolves the
/// linked database project from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatScope {
    pub user_id: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct QueryOutcome {
    pub rows: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("no connected project")]
    NoConnectedProject,
    #[error("query rejected: {0}")]
    Rejected(String),
    #[error("query executor unavailable")]
    Unavailable,
}

/// Runs SQL against the database project linked to a chat.
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, scope: &ChatScope, query: &str) -> Result<QueryOutcome, QueryError>;
}
