use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::executor::{ChatScope, QueryExecutor};

#[derive(Default)]
struct ContextState {
    user_id: Option<String>,
    chat_id: Option<String>,
    executor: Option<Arc<dyn QueryExecutor>>,
}

/// Session-wide values some actions need when they run.
///
/// Cloning yields another handle to the same state: the session keeps one
/// handle for its setters and the workbench reads through another.
#[derive(Clone, Default)]
pub struct SessionContext {
    inner: Arc<Mutex<ContextState>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_user_id(&self, user_id: impl Into<String>) {
        self.lock().user_id = Some(user_id.into());
    }

    pub fn set_chat_id(&self, chat_id: impl Into<String>) {
        self.lock().chat_id = Some(chat_id.into());
    }

    pub fn set_query_executor(&self, executor: Arc<dyn QueryExecutor>) {
        self.lock().executor = Some(executor);
    }

    pub fn clear_query_executor(&self) {
        self.lock().executor = None;
    }

    pub fn user_id(&self) -> Option<String> {
        self.lock().user_id.clone()
    }

    pub fn chat_id(&self) -> Option<String> {
        self.lock().chat_id.clone()
    }

    /// Both ids, or `None` while either is unknown.
    pub fn scope(&self) -> Option<ChatScope> {
        let state = self.lock();
        Some(ChatScope {
            user_id: state.user_id.clone()?,
            chat_id: state.chat_id.clone()?,
        })
    }

    pub fn query_executor(&self) -> Option<Arc<dyn QueryExecutor>> {
        self.lock().executor.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ContextState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("SessionContext")
            .field("user_id", &state.user_id)
            .field("chat_id", &state.chat_id)
            .field("has_executor", &state.executor.is_some())
            .finish()
    }
}
