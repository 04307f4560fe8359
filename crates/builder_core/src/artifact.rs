use builder_logging::builder_warn;
use serde::{Deserialize, Serialize};

use crate::tag::TagAttributes;

const BUNDLED_TYPE: &str = "bundled";

/// Metadata attached to an artifact when its opening tag is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: String,
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
}

impl ArtifactMetadata {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artifact_type: None,
        }
    }

    pub fn with_type(mut self, artifact_type: impl Into<String>) -> Self {
        self.artifact_type = Some(artifact_type.into());
        self
    }

    pub(crate) fn from_attributes(attributes: &TagAttributes) -> Self {
        let id = attributes.get("id").unwrap_or_else(|| {
            builder_warn!("artifact id missing");
            ""
        });
        let title = attributes.get("title").unwrap_or_else(|| {
            builder_warn!("artifact title missing");
            ""
        });
        Self {
            id: id.to_string(),
            title: title.to_string(),
            artifact_type: attributes.get("type").map(ToOwned::to_owned),
        }
    }

    /// Bundled artifacts carry the project template rather than a reply to the user.
    pub fn is_bundled(&self) -> bool {
        self.artifact_type.as_deref() == Some(BUNDLED_TYPE)
    }
}
