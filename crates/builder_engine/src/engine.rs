use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use builder_logging::{builder_debug, builder_error};

use crate::executor::{ChatScope, QueryError, QueryExecutor};
use crate::{ActionKey, EngineEvent};

enum EngineCommand {
    Execute {
        key: ActionKey,
        scope: ChatScope,
        query: String,
        executor: Arc<dyn QueryExecutor>,
    },
}

/// Runs database queries off the caller's thread and hands results back
/// through a channel the caller polls.
pub struct QueryDispatcher {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl QueryDispatcher {
    pub fn new() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    builder_error!("QueryDispatcher: failed to start runtime: {err}");
                    while let Ok(EngineCommand::Execute { key, .. }) = cmd_rx.recv() {
                        let _ = event_tx.send(EngineEvent::QueryFinished {
                            key,
                            result: Err(QueryError::Unavailable),
                        });
                    }
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(command, event_tx).await;
                });
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn submit(
        &self,
        key: ActionKey,
        scope: ChatScope,
        query: impl Into<String>,
        executor: Arc<dyn QueryExecutor>,
    ) {
        builder_debug!("QueryDispatcher: submitting {key}");
        let _ = self.cmd_tx.send(EngineCommand::Execute {
            key,
            scope,
            query: query.into(),
            executor,
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

impl Default for QueryDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

async fn handle_command(command: EngineCommand, event_tx: mpsc::Sender<EngineEvent>) {
    match command {
        EngineCommand::Execute {
            key,
            scope,
            query,
            executor,
        } => {
            let result = executor.execute(&scope, &query).await;
            let _ = event_tx.send(EngineEvent::QueryFinished { key, result });
        }
    }
}
