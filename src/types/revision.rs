//! Document revision types

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Front-matter key-values of a document
pub type Metadata = BTreeMap<String, Value>;

/// One stored revision of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionRef {
    /// Revision number; 1 is the unnumbered file
    pub number: u32,
    /// Storage key (file name) inside the content store
    pub key: String,
}

impl RevisionRef {
    pub fn new(number: u32, key: impl Into<String>) -> Self {
        Self {
            number,
            key: key.into(),
        }
    }

    /// Version label as used in URLs and analytics (`v3`)
    pub fn label(&self) -> String {
        format!("v{}", self.number)
    }
}

/// Which revision a caller wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevisionRequest {
    /// Highest revision number present
    #[default]
    Latest,
    /// Exactly this revision, or nothing
    Exact(u32),
}

impl From<Option<u32>> for RevisionRequest {
    fn from(value: Option<u32>) -> Self {
        match value {
            Some(n) => RevisionRequest::Exact(n),
            None => RevisionRequest::Latest,
        }
    }
}

/// A revision loaded and split into body and metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedContent {
    pub body: String,
    pub metadata: Metadata,
    pub revision: u32,
    /// All sibling revisions, ascending
    pub revisions: Vec<RevisionRef>,
    pub is_latest: bool,
}

impl ParsedContent {
    /// String-valued metadata field, if present and a string
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    /// Whether readers may see the version navigation
    ///
    /// Only an explicit `public-versions: false` hides it.
    pub fn versions_public(&self) -> bool {
        !matches!(self.metadata.get("public-versions"), Some(Value::Bool(false)))
    }

    pub fn latest_revision(&self) -> u32 {
        self.revisions.last().map(|r| r.number).unwrap_or(self.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content_with(metadata: Metadata) -> ParsedContent {
        ParsedContent {
            body: String::new(),
            metadata,
            revision: 1,
            revisions: vec![RevisionRef::new(1, "a.md")],
            is_latest: true,
        }
    }

    #[test]
    fn test_versions_public_defaults_true() {
        assert!(content_with(Metadata::new()).versions_public());

        let mut meta = Metadata::new();
        meta.insert("public-versions".to_string(), json!("no"));
        assert!(content_with(meta).versions_public());
    }

    #[test]
    fn test_versions_public_false() {
        let mut meta = Metadata::new();
        meta.insert("public-versions".to_string(), json!(false));
        assert!(!content_with(meta).versions_public());
    }

    #[test]
    fn test_revision_request_from_option() {
        assert_eq!(RevisionRequest::from(None), RevisionRequest::Latest);
        assert_eq!(RevisionRequest::from(Some(2)), RevisionRequest::Exact(2));
    }
}
