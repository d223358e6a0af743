//! Aggregate statistics returned to the admin surface

use std::collections::BTreeMap;

use serde::Serialize;

use super::visit::VisitEvent;

/// Derived view over the persisted analytics log
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total: usize,
    pub today: usize,
    pub week: usize,
    pub month: usize,
    /// Ranked by count descending, ties in order of first appearance
    pub popular_pages: Vec<PageCount>,
    /// Keyed by page name without the leading slash
    pub page_view_counts: BTreeMap<String, PageViews>,
    pub audience: AudienceSplit,
    /// Ranked like `popular_pages`; absent referers land in `direct`
    pub traffic_sources: Vec<SourceCount>,
    /// Newest first
    pub recent_visits: Vec<VisitEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageCount {
    pub page: String,
    pub count: usize,
}

/// Views of one page, split by version label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageViews {
    #[serde(flatten)]
    pub by_version: BTreeMap<String, usize>,
    #[serde(rename = "_total")]
    pub total: usize,
}

impl PageViews {
    pub fn version(&self, label: &str) -> usize {
        self.by_version.get(label).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AudienceSplit {
    pub humans: usize,
    pub bots: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub count: usize,
}
