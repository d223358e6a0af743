//! Revision resolution over a content store
//!
//! File naming:
//! - `<base>.md` is revision 1
//! - `<base>.v<N>.md` is revision N (decimal, no leading zeros, N >= 1)
//!
//! A suffix that does not fit the grammar is part of the base name, so
//! `notes.vx.md` is revision 1 of `notes.vx`.

use std::collections::BTreeMap;

use tracing::debug;

use super::front_matter::split_front_matter;
use super::{ContentSource, FsContentSource};
use crate::types::{ParsedContent, RevisionRef, RevisionRequest};

const EXTENSION: &str = ".md";

/// A file name decomposed into document and revision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedName<'a> {
    pub base: &'a str,
    pub number: u32,
    /// Whether the number came from a `.v<N>` suffix
    pub explicit: bool,
}

/// Parse a store file name into (base name, revision)
///
/// Returns `None` for files that are not markdown documents.
pub fn parse_file_name(name: &str) -> Option<ParsedName<'_>> {
    let stem = name.strip_suffix(EXTENSION)?;
    if stem.is_empty() {
        return None;
    }

    if let Some((base, digits)) = stem.rsplit_once(".v") {
        if !base.is_empty() {
            if let Some(number) = parse_revision_number(digits) {
                return Some(ParsedName {
                    base,
                    number,
                    explicit: true,
                });
            }
        }
    }

    Some(ParsedName {
        base: stem,
        number: 1,
        explicit: false,
    })
}

fn parse_revision_number(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

/// Whether a requested name can address a document at all
pub fn is_valid_base_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

/// Sort ascending and drop duplicate numbers
///
/// `<base>.md` and `<base>.v1.md` both claim revision 1; the unnumbered
/// file wins.
fn normalize(mut found: Vec<(u32, bool, String)>) -> Vec<RevisionRef> {
    found.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    found.dedup_by_key(|(number, _, _)| *number);
    found
        .into_iter()
        .map(|(number, _, key)| RevisionRef::new(number, key))
        .collect()
}

/// Maps document names and revision requests to stored revisions
pub struct RevisionResolver<S = FsContentSource> {
    source: S,
}

impl<S: ContentSource> RevisionResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// All revisions of `base_name`, ascending by number
    ///
    /// An unreadable store or an unknown name yields an empty list.
    pub fn list_revisions(&self, base_name: &str) -> Vec<RevisionRef> {
        if !is_valid_base_name(base_name) {
            return Vec::new();
        }

        let entries = match self.source.list_entries() {
            Ok(entries) => entries,
            Err(e) => {
                debug!(base_name, error = %e, "content store unreadable");
                return Vec::new();
            }
        };

        let found = entries
            .iter()
            .filter_map(|name| {
                let parsed = parse_file_name(name)?;
                (parsed.base == base_name).then(|| (parsed.number, parsed.explicit, name.clone()))
            })
            .collect();

        normalize(found)
    }

    /// Load one revision of a document
    ///
    /// `Latest` resolves to the highest revision present. An `Exact`
    /// revision that does not exist is `None`; there is no fallback. A file
    /// that cannot be read or whose header is malformed is also `None`.
    pub fn get_revision(
        &self,
        base_name: &str,
        request: RevisionRequest,
    ) -> Option<ParsedContent> {
        let revisions = self.list_revisions(base_name);
        let latest = revisions.last()?.number;

        let target = match request {
            RevisionRequest::Latest => revisions.last()?,
            RevisionRequest::Exact(n) => revisions.iter().find(|r| r.number == n)?,
        }
        .clone();

        let raw = match self.source.read(&target.key) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(key = %target.key, error = %e, "revision unreadable");
                return None;
            }
        };

        let doc = match split_front_matter(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                debug!(key = %target.key, error = %e, "malformed front matter");
                return None;
            }
        };

        Some(ParsedContent {
            body: doc.body,
            metadata: doc.metadata,
            revision: target.number,
            is_latest: target.number == latest,
            revisions,
        })
    }

    /// Every document in the store with its revisions, from a single scan
    pub fn list_all_documents(&self) -> BTreeMap<String, Vec<RevisionRef>> {
        let entries = match self.source.list_entries() {
            Ok(entries) => entries,
            Err(e) => {
                debug!(error = %e, "content store unreadable");
                return BTreeMap::new();
            }
        };

        let mut grouped: BTreeMap<String, Vec<(u32, bool, String)>> = BTreeMap::new();
        for name in &entries {
            if let Some(parsed) = parse_file_name(name) {
                grouped
                    .entry(parsed.base.to_string())
                    .or_default()
                    .push((parsed.number, parsed.explicit, name.clone()));
            }
        }

        grouped
            .into_iter()
            .map(|(base, found)| (base, normalize(found)))
            .collect()
    }
}
