use std::collections::HashMap;

use builder_logging::{builder_trace, builder_warn};

use crate::state::OpenArtifact;
use crate::tag::{match_tag, partial_suffix_len, TagAttributes, TagKind, TagMatch};
use crate::{
    ActionCallbackData, ActionKind, ArtifactCallbackData, ArtifactMetadata, MessageState,
    OpenAction, OpenElement, ParsedAction, ParserCallbacks, ParserPhase, ACTION_TAG_CLOSE,
    ACTION_TAG_OPEN, ARTIFACT_TAG_OPEN,
};

/// CSS class of the element emitted in place of an artifact tag.
pub const ARTIFACT_PLACEHOLDER_CLASS: &str = "__boltArtifact__";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Emit an empty `<div>` carrying the message id where an artifact opens,
    /// so a renderer can mount the artifact card in the prose.
    pub emit_artifact_placeholder: bool,
    /// Fire `on_action_stream` for every action kind, not only file writes.
    pub stream_all_actions: bool,
}

/// Incremental parser for the artifact markup, one state slot per message id.
///
/// Each `parse` call receives the whole buffer received so far for a message and
/// returns only the prose produced since the previous call. A message id must
/// not be advanced from two call sites at once; ordering of such calls is
/// undefined.
#[derive(Debug)]
pub struct StreamingMessageParser<C> {
    callbacks: C,
    options: ParserOptions,
    messages: HashMap<String, MessageState>,
}

impl<C: ParserCallbacks> StreamingMessageParser<C> {
    pub fn new(callbacks: C) -> Self {
        Self::with_options(callbacks, ParserOptions::default())
    }

    pub fn with_options(callbacks: C, options: ParserOptions) -> Self {
        Self {
            callbacks,
            options,
            messages: HashMap::new(),
        }
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut C {
        &mut self.callbacks
    }

    pub fn into_callbacks(self) -> C {
        self.callbacks
    }

    pub fn message_state(&self, message_id: &str) -> Option<&MessageState> {
        self.messages.get(message_id)
    }

    /// `Idle` for messages that were never parsed.
    pub fn phase(&self, message_id: &str) -> ParserPhase {
        self.messages
            .get(message_id)
            .map(MessageState::phase)
            .unwrap_or_default()
    }

    pub fn open_elements(&self, message_id: &str) -> Vec<OpenElement<'_>> {
        self.messages
            .get(message_id)
            .map(MessageState::open_elements)
            .unwrap_or_default()
    }

    /// Advance the parse of `message_id` over `input` and return the new prose.
    pub fn parse(&mut self, message_id: &str, input: &str) -> String {
        let state = self.messages.entry(message_id.to_owned()).or_default();
        let mut scan = Scan {
            message_id,
            input,
            callbacks: &mut self.callbacks,
            options: self.options,
            output: String::new(),
        };
        scan.run(state);
        scan.output
    }

    /// Parse the final buffer of a message whose stream has ended.
    ///
    /// Text held back because it might have been the start of a tag is
    /// released as prose. The body of an unterminated action stays withheld.
    pub fn finish(&mut self, message_id: &str, input: &str) -> String {
        let mut output = self.parse(message_id, input);
        if let Some(state) = self.messages.get_mut(message_id) {
            if state.phase() != ParserPhase::InAction {
                if let Some(rest) = input.get(state.position..) {
                    output.push_str(rest);
                    state.position = input.len();
                }
            }
        }
        output
    }

    /// Drop the stored state of one message. Returns whether it existed.
    pub fn reset_message(&mut self, message_id: &str) -> bool {
        self.messages.remove(message_id).is_some()
    }

    /// Drop all stored message state, e.g. when the message list is replaced.
    pub fn reset(&mut self) {
        self.messages.clear();
    }
}

enum Step {
    /// Consumed input up to the given offset; keep scanning.
    Advance(usize),
    /// Need more input; resume at the given offset next call.
    Wait(usize),
}

struct Scan<'a, C> {
    message_id: &'a str,
    input: &'a str,
    callbacks: &'a mut C,
    options: ParserOptions,
    output: String,
}

impl<C: ParserCallbacks> Scan<'_, C> {
    fn run(&mut self, state: &mut MessageState) {
        let mut cursor = state.position;
        if cursor > self.input.len() || !self.input.is_char_boundary(cursor) {
            builder_warn!(
                "message {}: buffer of {} bytes is behind parsed position {}, ignoring",
                self.message_id,
                self.input.len(),
                cursor
            );
            return;
        }

        while cursor < self.input.len() {
            let step = match state.phase() {
                ParserPhase::InAction => self.action_body(state, cursor),
                ParserPhase::Idle | ParserPhase::InArtifact => self.markup(state, cursor),
            };
            match step {
                Step::Advance(next) => cursor = next,
                Step::Wait(next) => {
                    cursor = next;
                    break;
                }
            }
        }
        state.position = cursor;
    }

    fn markup(&mut self, state: &mut MessageState, cursor: usize) -> Step {
        let input = self.input;
        let rest = &input[cursor..];
        let Some(lt) = rest.find('<') else {
            self.output.push_str(rest);
            return Step::Advance(input.len());
        };
        self.output.push_str(&rest[..lt]);

        let at = cursor + lt;
        let candidates: &[TagKind] = if state.artifact.is_some() {
            &[TagKind::ActionOpen, TagKind::ArtifactClose]
        } else {
            &[TagKind::ArtifactOpen]
        };
        match match_tag(&input[at..], candidates) {
            TagMatch::Incomplete => Step::Wait(at),
            TagMatch::NoMatch => {
                self.output.push('<');
                Step::Advance(at + 1)
            }
            TagMatch::Complete {
                kind,
                len,
                self_closing,
            } => {
                let tag = &input[at..at + len];
                match kind {
                    TagKind::ArtifactOpen => self.open_artifact(state, tag, self_closing),
                    TagKind::ActionOpen => self.open_action(state, tag, self_closing),
                    TagKind::ArtifactClose => self.close_artifact(state),
                }
                Step::Advance(at + len)
            }
        }
    }

    fn action_body(&mut self, state: &mut MessageState, cursor: usize) -> Step {
        let input = self.input;
        let Some(artifact) = state.artifact.as_mut() else {
            return Step::Wait(cursor);
        };
        let Some(action) = artifact.action.as_mut() else {
            return Step::Wait(cursor);
        };

        let rest = &input[cursor..];
        if let Some(offset) = rest.find(ACTION_TAG_CLOSE) {
            if offset > 0 {
                action.content.push_str(&rest[..offset]);
                self.stream_action(&artifact.metadata.id, action);
            }
            if let Some(action) = artifact.action.take() {
                self.close_action(&artifact.metadata.id, action);
            }
            return Step::Advance(cursor + offset + ACTION_TAG_CLOSE.len());
        }

        // A trailing `</bolt...` may be the start of the closing tag.
        let available = rest.len() - partial_suffix_len(rest, ACTION_TAG_CLOSE);
        if available > 0 {
            action.content.push_str(&rest[..available]);
            self.stream_action(&artifact.metadata.id, action);
        }
        Step::Wait(cursor + available)
    }

    fn stream_action(&mut self, artifact_id: &str, action: &OpenAction) {
        if !action.kind.is_file() && !self.options.stream_all_actions {
            return;
        }
        let data = ActionCallbackData {
            message_id: self.message_id.to_string(),
            artifact_id: artifact_id.to_string(),
            action_index: action.index,
            action: action.snapshot(),
        };
        self.callbacks.on_action_stream(&data);
    }

    fn open_artifact(&mut self, state: &mut MessageState, tag: &str, self_closing: bool) {
        let metadata =
            ArtifactMetadata::from_attributes(&TagAttributes::parse(tag, ARTIFACT_TAG_OPEN));
        builder_trace!(
            "artifact open: message={} id={} title={:?}",
            self.message_id,
            metadata.id,
            metadata.title
        );
        let data = ArtifactCallbackData {
            message_id: self.message_id.to_string(),
            artifact: metadata,
        };
        self.callbacks.on_artifact_open(&data);

        if self.options.emit_artifact_placeholder {
            self.output.push_str(&format!(
                r#"<div class="{ARTIFACT_PLACEHOLDER_CLASS}" data-message-id="{}"></div>"#,
                self.message_id
            ));
        }

        if self_closing {
            builder_trace!("artifact close: message={} id={}", self.message_id, data.artifact.id);
            self.callbacks.on_artifact_close(&data);
        } else {
            state.artifact = Some(OpenArtifact {
                metadata: data.artifact,
                action: None,
            });
        }
    }

    fn open_action(&mut self, state: &mut MessageState, tag: &str, self_closing: bool) {
        let Some(artifact) = state.artifact.as_mut() else {
            return;
        };
        let index = state.action_counter;
        state.action_counter += 1;

        let kind = ActionKind::from_attributes(&TagAttributes::parse(tag, ACTION_TAG_OPEN));
        builder_trace!(
            "action open: message={} artifact={} index={} kind={}",
            self.message_id,
            artifact.metadata.id,
            index,
            kind
        );
        let data = ActionCallbackData {
            message_id: self.message_id.to_string(),
            artifact_id: artifact.metadata.id.clone(),
            action_index: index,
            action: ParsedAction::new(kind.clone(), ""),
        };
        self.callbacks.on_action_open(&data);

        let action = OpenAction {
            index,
            kind,
            content: String::new(),
        };
        if self_closing {
            self.close_action(&artifact.metadata.id, action);
        } else {
            artifact.action = Some(action);
        }
    }

    fn close_action(&mut self, artifact_id: &str, action: OpenAction) {
        builder_trace!(
            "action close: message={} artifact={} index={}",
            self.message_id,
            artifact_id,
            action.index
        );
        let data = ActionCallbackData {
            message_id: self.message_id.to_string(),
            artifact_id: artifact_id.to_string(),
            action_index: action.index,
            action: action.finish(),
        };
        self.callbacks.on_action_close(&data);
    }

    fn close_artifact(&mut self, state: &mut MessageState) {
        let Some(artifact) = state.artifact.take() else {
            return;
        };
        builder_trace!(
            "artifact close: message={} id={}",
            self.message_id,
            artifact.metadata.id
        );
        let data = ArtifactCallbackData {
            message_id: self.message_id.to_string(),
            artifact: artifact.metadata,
        };
        self.callbacks.on_artifact_close(&data);
    }
}
