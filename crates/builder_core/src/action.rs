use std::fmt;

use builder_logging::builder_debug;
use serde::{Deserialize, Serialize};

use crate::tag::TagAttributes;

/// What an action asks the workbench to do, with the fields each kind carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Write the action content to `path` in the project workspace.
    File { path: String },
    /// Run the content as a shell command.
    Shell,
    /// Start the dev server with the content as command.
    Start,
    /// Deploy the current workspace.
    Deploy,
    /// Database operation. `subtype` is opaque to the parser (`sql`, `storage`, ...).
    Database { subtype: String },
    /// Missing or unknown `type` attribute.
    Generic { declared: Option<String> },
}

impl ActionKind {
    pub(crate) fn from_attributes(attributes: &TagAttributes) -> Self {
        let declared = attributes.get("type");
        match declared {
            Some("file") => {
                let path = attributes.get("filePath").unwrap_or_default();
                if path.is_empty() {
                    builder_debug!("file action without a filePath attribute");
                }
                ActionKind::File {
                    path: path.to_string(),
                }
            }
            Some("shell") => ActionKind::Shell,
            Some("start") => ActionKind::Start,
            Some("deploy") => ActionKind::Deploy,
            Some("supabase") | Some("database") => ActionKind::Database {
                subtype: attributes
                    .get("subType")
                    .or_else(|| attributes.get("subtype"))
                    .unwrap_or_default()
                    .to_string(),
            },
            other => {
                builder_debug!("unknown action type {:?}", other);
                ActionKind::Generic {
                    declared: other.map(ToOwned::to_owned),
                }
            }
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, ActionKind::File { .. })
    }

    /// The `type` attribute value this kind is written as in the markup.
    pub fn type_name(&self) -> &str {
        match self {
            ActionKind::File { .. } => "file",
            ActionKind::Shell => "shell",
            ActionKind::Start => "start",
            ActionKind::Deploy => "deploy",
            ActionKind::Database { .. } => "supabase",
            ActionKind::Generic { declared } => declared.as_deref().unwrap_or(""),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::File { path } => write!(f, "file {path}"),
            ActionKind::Database { subtype } => write!(f, "database/{subtype}"),
            ActionKind::Generic { declared: None } => write!(f, "generic"),
            other => write!(f, "{}", other.type_name()),
        }
    }
}

/// One recognized instruction with the content accumulated so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAction {
    #[serde(flatten)]
    pub kind: ActionKind,
    pub content: String,
}

impl ParsedAction {
    pub fn new(kind: ActionKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    pub fn file_path(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::File { path } => Some(path),
            _ => None,
        }
    }
}
