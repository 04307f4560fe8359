use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use builder_engine::{
    ActionKey, ChatScope, EngineEvent, QueryDispatcher, QueryError, QueryExecutor, QueryOutcome,
};
use pretty_assertions::assert_eq;

struct SlowEcho;

#[async_trait]
impl QueryExecutor for SlowEcho {
    async fn execute(&self, _scope: &ChatScope, query: &str) -> Result<QueryOutcome, QueryError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(QueryOutcome {
            rows: vec![serde_json::Value::String(query.to_string())],
        })
    }
}

struct Disconnected;

#[async_trait]
impl QueryExecutor for Disconnected {
    async fn execute(&self, _scope: &ChatScope, _query: &str) -> Result<QueryOutcome, QueryError> {
        Err(QueryError::NoConnectedProject)
    }
}

fn scope() -> ChatScope {
    ChatScope {
        user_id: "u".to_string(),
        chat_id: "c".to_string(),
    }
}

#[test]
fn results_come_back_through_the_channel() {
    let dispatcher = QueryDispatcher::new();
    let key = ActionKey::new("m1", 3);
    dispatcher.submit(key.clone(), scope(), "select 1", Arc::new(SlowEcho));

    let event = dispatcher.recv_timeout(Duration::from_secs(5));
    assert_eq!(
        event,
        Some(EngineEvent::QueryFinished {
            key,
            result: Ok(QueryOutcome {
                rows: vec![serde_json::Value::String("select 1".to_string())],
            }),
        })
    );
}

#[test]
fn executor_errors_are_reported_not_panicked() {
    let dispatcher = QueryDispatcher::new();
    dispatcher.submit(ActionKey::new("m1", 0), scope(), "select 1", Arc::new(Disconnected));

    match dispatcher.recv_timeout(Duration::from_secs(5)) {
        Some(EngineEvent::QueryFinished { result, .. }) => {
            assert_eq!(result, Err(QueryError::NoConnectedProject));
            assert_eq!(
                result.unwrap_err().to_string(),
                "no connected project".to_string()
            );
        }
        None => panic!("no event received"),
    }
}
