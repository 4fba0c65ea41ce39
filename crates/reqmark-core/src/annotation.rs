//! The annotation model

use serde::{Deserialize, Serialize};

use crate::position::Range;

/// Opaque identifier of an annotation.
///
/// Callers never look inside it. Fresh ids are UUIDv4, but ids read back
/// from an existing annotations file are kept verbatim whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

impl AnnotationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a fresh, collision-resistant id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AnnotationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A requirement note bound to a range of a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Assigned at creation, never reassigned
    pub id: AnnotationId,
    /// Absolute path of the annotated file; the partition key for queries
    pub file_path: String,
    /// Annotated span
    pub range: Range,
    /// The requirement text, never empty
    pub text: String,
    /// Highlight color (e.g. `#FF0000`), also the decoration grouping key
    pub color: String,
    /// Link to the requirement, an absolute URL when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Annotation {
    /// Build an annotation with a freshly generated id
    pub fn new(
        file_path: impl Into<String>,
        range: Range,
        text: impl Into<String>,
        color: impl Into<String>,
        url: Option<String>,
    ) -> Self {
        Self {
            id: AnnotationId::generate(),
            file_path: file_path.into(),
            range,
            text: text.into(),
            color: color.into(),
            url,
        }
    }
}
