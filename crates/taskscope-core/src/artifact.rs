//! Artifacts produced by a task.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ArtifactId;

/// Kind of content carried by an artifact part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartType {
    #[default]
    Text,
    File,
    Json,
    Image,
}

impl PartType {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PartType::Text => "text",
            PartType::File => "file",
            PartType::Json => "json",
            PartType::Image => "image",
        }
    }
}

impl fmt::Display for PartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_mime() -> String {
    "text/plain".to_string()
}

/// One typed piece of an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPart {
    #[serde(rename = "type")]
    pub part_type: PartType,

    #[serde(default = "default_mime")]
    pub mime: String,

    /// Inline content, present for small textual parts.
    #[serde(default)]
    pub content: Option<String>,

    /// Storage reference for large parts.
    #[serde(default)]
    pub uri: Option<String>,
}

/// A named output object produced by a task. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub artifact_id: ArtifactId,
    pub name: String,

    /// Content size in bytes.
    #[serde(default)]
    pub size: u64,

    #[serde(default)]
    pub parts: Vec<ArtifactPart>,
}
