use serde::Serialize;

use crate::{ArtifactMetadata, ParsedAction};

/// Payload for artifact open and close notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactCallbackData {
    pub message_id: String,
    #[serde(flatten)]
    pub artifact: ArtifactMetadata,
}

/// Payload for action notifications.
///
/// `action_index` is unique within a message and increases in tag order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCallbackData {
    pub message_id: String,
    pub artifact_id: String,
    pub action_index: usize,
    pub action: ParsedAction,
}

/// Receiver of parser lifecycle events (the workbench).
///
/// Callbacks run synchronously inside `parse`; anything slow must be handed off
/// by the implementation. Every method defaults to doing nothing.
pub trait ParserCallbacks {
    fn on_artifact_open(&mut self, _data: &ArtifactCallbackData) {}
    fn on_artifact_close(&mut self, _data: &ArtifactCallbackData) {}
    fn on_action_open(&mut self, _data: &ActionCallbackData) {}
    /// Content so far of an action that is still open.
    fn on_action_stream(&mut self, _data: &ActionCallbackData) {}
    fn on_action_close(&mut self, _data: &ActionCallbackData) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl ParserCallbacks for NoopCallbacks {}

impl<T: ParserCallbacks + ?Sized> ParserCallbacks for &mut T {
    fn on_artifact_open(&mut self, data: &ArtifactCallbackData) {
        (**self).on_artifact_open(data);
    }

    fn on_artifact_close(&mut self, data: &ArtifactCallbackData) {
        (**self).on_artifact_close(data);
    }

    fn on_action_open(&mut self, data: &ActionCallbackData) {
        (**self).on_action_open(data);
    }

    fn on_action_stream(&mut self, data: &ActionCallbackData) {
        (**self).on_action_stream(data);
    }

    fn on_action_close(&mut self, data: &ActionCallbackData) {
        (**self).on_action_close(data);
    }
}

/// One parser notification, as recorded by [`EventRecorder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ParserEvent {
    ArtifactOpen(ArtifactCallbackData),
    ArtifactClose(ArtifactCallbackData),
    ActionOpen(ActionCallbackData),
    ActionStream(ActionCallbackData),
    ActionClose(ActionCallbackData),
}

impl ParserEvent {
    pub fn message_id(&self) -> &str {
        match self {
            ParserEvent::ArtifactOpen(data) | ParserEvent::ArtifactClose(data) => &data.message_id,
            ParserEvent::ActionOpen(data)
            | ParserEvent::ActionStream(data)
            | ParserEvent::ActionClose(data) => &data.message_id,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, ParserEvent::ActionStream(_))
    }
}

/// Sink that keeps every event in arrival order.
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    events: Vec<ParserEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ParserEvent] {
        &self.events
    }

    pub fn take(&mut self) -> Vec<ParserEvent> {
        std::mem::take(&mut self.events)
    }

    /// Events other than `ActionStream`, whose count depends on chunking.
    pub fn lifecycle(&self) -> Vec<ParserEvent> {
        self.events
            .iter()
            .filter(|event| !event.is_stream())
            .cloned()
            .collect()
    }
}

impl ParserCallbacks for EventRecorder {
    fn on_artifact_open(&mut self, data: &ArtifactCallbackData) {
        self.events.push(ParserEvent::ArtifactOpen(data.clone()));
    }

    fn on_artifact_close(&mut self, data: &ArtifactCallbackData) {
        self.events.push(ParserEvent::ArtifactClose(data.clone()));
    }

    fn on_action_open(&mut self, data: &ActionCallbackData) {
        self.events.push(ParserEvent::ActionOpen(data.clone()));
    }

    fn on_action_stream(&mut self, data: &ActionCallbackData) {
        self.events.push(ParserEvent::ActionStream(data.clone()));
    }

    fn on_action_close(&mut self, data: &ActionCallbackData) {
        self.events.push(ParserEvent::ActionClose(data.clone()));
    }
}
