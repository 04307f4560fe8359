//! Builder core: streaming parser for build instructions embedded in LLM output.
mod action;
mod artifact;
mod callbacks;
mod parser;
mod state;
mod tag;

pub use action::{ActionKind, ParsedAction};
pub use artifact::ArtifactMetadata;
pub use callbacks::{
    ActionCallbackData, ArtifactCallbackData, EventRecorder, NoopCallbacks, ParserCallbacks,
    ParserEvent,
};
pub use parser::{ParserOptions, StreamingMessageParser, ARTIFACT_PLACEHOLDER_CLASS};
pub use state::{MessageState, OpenAction, OpenElement, ParserPhase};
pub use tag::{ACTION_TAG_CLOSE, ACTION_TAG_OPEN, ARTIFACT_TAG_CLOSE, ARTIFACT_TAG_OPEN};
