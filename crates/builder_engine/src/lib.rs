//! Builder engine: workbench state, query dispatch and workspace export.
mod context;
mod database;
mod engine;
mod executor;
mod files;
mod persist;
mod session;
mod types;
mod workbench;

pub use context::SessionContext;
pub use database::{BucketAction, DatabaseOperation, DatabasePayloadError, SqlSource, StorageRequest};
pub use engine::QueryDispatcher;
pub use executor::{ChatScope, QueryError, QueryExecutor, QueryOutcome};
pub use files::{content_digest, normalize_path, FileEntry, WorkspaceFiles, WorkspacePathError};
pub use persist::{ensure_output_dir, export_workspace, AtomicFileWriter, ExportSummary, PersistError};
pub use session::{ChatMessage, ChatSession, Role};
pub use types::{ActionKey, ActionStatus, EngineEvent};
pub use workbench::{
    ActionRecord, ArtifactRecord, ArtifactSnapshot, FileSnapshot, RunRequest, RunnableAction,
    Workbench, WorkbenchSnapshot,
};
