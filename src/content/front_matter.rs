//! Front-matter splitting
//!
//! A document may open with a YAML header fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Getting started
//! theme: dark
//! public-versions: false
//! ---
//! # Body markdown
//! ```

use crate::error::CmsResult;
use crate::types::Metadata;

/// A raw document split into its header and body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitDocument {
    pub metadata: Metadata,
    pub body: String,
}

/// Split a raw document into metadata and body
///
/// Text without an opening fence, or with an opening fence that is never
/// closed, is all body. A header that is not a YAML mapping is an error.
pub fn split_front_matter(raw: &str) -> CmsResult<SplitDocument> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let Some(rest) = after_opening_fence(raw) else {
        return Ok(SplitDocument {
            metadata: Metadata::new(),
            body: raw.to_string(),
        });
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if is_fence(line) {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok(SplitDocument {
                metadata: parse_header(header)?,
                body: body.to_string(),
            });
        }
        offset += line.len();
    }

    Ok(SplitDocument {
        metadata: Metadata::new(),
        body: raw.to_string(),
    })
}

fn after_opening_fence(raw: &str) -> Option<&str> {
    let (first, rest) = raw.split_once('\n')?;
    is_fence(first).then_some(rest)
}

fn is_fence(line: &str) -> bool {
    line.trim_end_matches(['\n', '\r']).trim_end() == "---"
}

fn parse_header(header: &str) -> CmsResult<Metadata> {
    if header.trim().is_empty() {
        return Ok(Metadata::new());
    }
    Ok(serde_yaml::from_str(header)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_with_header() {
        let raw = "---\ntitle: Hello\ndraft: true\ntags: [a, b]\n---\n# Heading\n\nText\n";

        let doc = split_front_matter(raw).unwrap();

        assert_eq!(doc.metadata["title"], json!("Hello"));
        assert_eq!(doc.metadata["draft"], json!(true));
        assert_eq!(doc.metadata["tags"], json!(["a", "b"]));
        assert_eq!(doc.body, "# Heading\n\nText\n");
    }

    #[test]
    fn test_no_header_is_all_body() {
        let raw = "# Just markdown\n---\nnot a header\n";

        let doc = split_front_matter(raw).unwrap();

        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, raw);
    }

    #[test]
    fn test_empty_header() {
        let doc = split_front_matter("---\n---\nbody").unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn test_crlf_fences() {
        let doc = split_front_matter("---\r\ntitle: Win\r\n---\r\nbody\r\n").unwrap();
        assert_eq!(doc.metadata["title"], json!("Win"));
        assert_eq!(doc.body, "body\r\n");
    }

    #[test]
    fn test_unclosed_header_is_body() {
        let raw = "---\ntitle: never closed\n";
        let doc = split_front_matter(raw).unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, raw);
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        let raw = "---\ntitle: [unclosed\n---\nbody\n";
        assert!(split_front_matter(raw).is_err());
    }

    #[test]
    fn test_scalar_header_is_error() {
        let raw = "---\njust a sentence\n---\nbody\n";
        assert!(split_front_matter(raw).is_err());
    }
}
