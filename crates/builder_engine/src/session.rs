use std::collections::BTreeMap;

use builder_core::{ParserOptions, StreamingMessageParser};
use builder_logging::builder_debug;
use serde::{Deserialize, Serialize};

use crate::context::SessionContext;
use crate::workbench::Workbench;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn assistant(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One chat: the parser, the workbench it drives and the prose rendered so
/// far for each assistant message.
pub struct ChatSession {
    parser: StreamingMessageParser<Workbench>,
    context: SessionContext,
    rendered: BTreeMap<usize, String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    pub fn with_options(options: ParserOptions) -> Self {
        let context = SessionContext::new();
        let workbench = Workbench::new(context.clone());
        Self {
            parser: StreamingMessageParser::with_options(workbench, options),
            context,
            rendered: BTreeMap::new(),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn workbench(&self) -> &Workbench {
        self.parser.callbacks()
    }

    pub fn workbench_mut(&mut self) -> &mut Workbench {
        self.parser.callbacks_mut()
    }

    pub fn parser(&self) -> &StreamingMessageParser<Workbench> {
        &self.parser
    }

    /// Feed the current message list. Only assistant messages are parsed; the
    /// new prose of each is appended to its rendered text, keyed by position
    /// in `messages`.
    pub fn parse_messages(&mut self, messages: &[ChatMessage]) -> &BTreeMap<usize, String> {
        for (index, message) in messages.iter().enumerate() {
            if message.role != Role::Assistant {
                continue;
            }
            let delta = self.parser.parse(&message.id, &message.content);
            self.append(index, &delta);
        }
        &self.rendered
    }

    /// Final parse of the message at `index` once its stream has ended.
    pub fn finish_message(&mut self, index: usize, message: &ChatMessage) -> &str {
        let delta = self.parser.finish(&message.id, &message.content);
        self.append(index, &delta)
    }

    pub fn rendered(&self, index: usize) -> Option<&str> {
        self.rendered.get(&index).map(String::as_str)
    }

    pub fn rendered_messages(&self) -> &BTreeMap<usize, String> {
        &self.rendered
    }

    /// Forget parser state and rendered text. Workspace files and action
    /// records stay with the workbench.
    pub fn reset(&mut self) {
        builder_debug!("ChatSession: reset {} rendered messages", self.rendered.len());
        self.parser.reset();
        self.rendered.clear();
    }

    fn append(&mut self, index: usize, delta: &str) -> &str {
        let entry = self.rendered.entry(index).or_default();
        entry.push_str(delta);
        entry
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
