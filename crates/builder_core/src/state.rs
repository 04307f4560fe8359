use crate::{ActionKind, ArtifactMetadata, ParsedAction};

/// Where a message's parse currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserPhase {
    #[default]
    Idle,
    InArtifact,
    InAction,
}

/// The action whose body is currently streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAction {
    pub index: usize,
    pub kind: ActionKind,
    /// Raw body received so far, untrimmed.
    pub content: String,
}

impl OpenAction {
    /// Leading whitespace after the opening tag is layout, not content.
    pub(crate) fn snapshot(&self) -> ParsedAction {
        ParsedAction::new(self.kind.clone(), self.content.trim_start())
    }

    pub(crate) fn finish(self) -> ParsedAction {
        ParsedAction::new(self.kind, self.content.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenArtifact {
    pub(crate) metadata: ArtifactMetadata,
    pub(crate) action: Option<OpenAction>,
}

/// Entry of the open-element stack, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenElement<'a> {
    Artifact(&'a ArtifactMetadata),
    Action(&'a OpenAction),
}

/// Per-message parse state.
///
/// The open stack is stored as an optional artifact holding an optional
/// action: an action cannot exist without its artifact, and only one action
/// is open at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageState {
    pub(crate) position: usize,
    pub(crate) artifact: Option<OpenArtifact>,
    pub(crate) action_counter: usize,
}

impl MessageState {
    /// Byte offset into the message buffer up to which input has been consumed.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn phase(&self) -> ParserPhase {
        match &self.artifact {
            None => ParserPhase::Idle,
            Some(OpenArtifact { action: None, .. }) => ParserPhase::InArtifact,
            Some(OpenArtifact {
                action: Some(_), ..
            }) => ParserPhase::InAction,
        }
    }

    pub fn current_artifact_id(&self) -> Option<&str> {
        self.artifact
            .as_ref()
            .map(|artifact| artifact.metadata.id.as_str())
    }

    /// Number of actions opened so far in this message.
    pub fn actions_seen(&self) -> usize {
        self.action_counter
    }

    pub fn open_elements(&self) -> Vec<OpenElement<'_>> {
        let mut elements = Vec::with_capacity(2);
        if let Some(artifact) = &self.artifact {
            elements.push(OpenElement::Artifact(&artifact.metadata));
            if let Some(action) = &artifact.action {
                elements.push(OpenElement::Action(action));
            }
        }
        elements
    }
}
