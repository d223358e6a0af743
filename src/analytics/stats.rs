//! Aggregate statistics over the persisted visit log
//!
//! Provides:
//! - Calendar-window counts (today, last 7 days, last 30 days)
//! - Page rankings and per-version view counts
//! - Human/bot split and referer host rankings
//! - The most recent visits

use std::collections::HashMap;

use axum::http::Uri;
use chrono::{DateTime, TimeZone};

use super::classify::BotClassifier;
use crate::types::{AggregateStats, AudienceSplit, PageCount, PageViews, SourceCount, VisitEvent};
use crate::utils::{days_before_start_of_day, start_of_day};

/// Bucket for visits without a referer
pub const DIRECT_SOURCE: &str = "direct";

/// Bucket for referers that carry no recognizable host
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Version label assumed for visits recorded without one
pub const DEFAULT_VERSION: &str = "v1";

/// Size limits for the ranked sections
#[derive(Debug, Clone, Copy)]
pub struct StatsLimits {
    pub top_pages: usize,
    pub top_sources: usize,
    pub recent_visits: usize,
}

impl Default for StatsLimits {
    fn default() -> Self {
        Self {
            top_pages: 10,
            top_sources: 10,
            recent_visits: 50,
        }
    }
}

/// Counts keyed by string, remembering first-seen order
#[derive(Default)]
struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<(String, usize)>,
}

impl Tally {
    fn add(&mut self, key: String) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    /// Highest counts first; the stable sort keeps first-seen order on ties
    fn ranked(mut self, limit: usize) -> Vec<(String, usize)> {
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        self.entries.truncate(limit);
        self.entries
    }
}

/// Referer grouping key: the lowercased host, or one of the synthetic buckets
pub fn traffic_source(referer: Option<&str>) -> String {
    let Some(referer) = referer.map(str::trim).filter(|r| !r.is_empty()) else {
        return DIRECT_SOURCE.to_string();
    };
    referer
        .parse::<Uri>()
        .ok()
        .and_then(|uri| uri.host().map(|h| h.to_lowercase()))
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
}

/// Key used in per-page view counts: the page path without its leading slash
///
/// The site root is recorded as `/` and reported as `index`, the document
/// that serves it.
pub fn page_key(page: &str) -> String {
    let key = page.strip_prefix('/').unwrap_or(page);
    if key.is_empty() {
        "index".to_string()
    } else {
        key.to_string()
    }
}

/// Computes `AggregateStats` from a slice of visits
#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    limits: StatsLimits,
    classifier: BotClassifier,
}

impl StatsCollector {
    pub fn new(limits: StatsLimits, classifier: BotClassifier) -> Self {
        Self { limits, classifier }
    }

    /// Collect all statistics, with calendar windows anchored at `now`
    pub fn collect<Tz: TimeZone>(&self, visits: &[VisitEvent], now: &DateTime<Tz>) -> AggregateStats {
        let today = start_of_day(now);
        let week = days_before_start_of_day(now, 7);
        let month = days_before_start_of_day(now, 30);

        let mut stats = AggregateStats {
            total: visits.len(),
            ..Default::default()
        };

        let mut pages = Tally::default();
        let mut sources = Tally::default();

        for visit in visits {
            if visit.timestamp >= today {
                stats.today += 1;
            }
            if visit.timestamp >= week {
                stats.week += 1;
            }
            if visit.timestamp >= month {
                stats.month += 1;
            }

            pages.add(match &visit.version {
                Some(version) => format!("{} ({})", visit.page, version),
                None => visit.page.clone(),
            });

            let views = stats
                .page_view_counts
                .entry(page_key(&visit.page))
                .or_insert_with(PageViews::default);
            let version = visit.version.as_deref().unwrap_or(DEFAULT_VERSION);
            *views.by_version.entry(version.to_string()).or_insert(0) += 1;
            views.total += 1;

            if self.classifier.is_bot(visit.user_agent.as_deref()) {
                stats.audience.bots += 1;
            } else {
                stats.audience.humans += 1;
            }

            sources.add(traffic_source(visit.referer.as_deref()));
        }

        stats.popular_pages = pages
            .ranked(self.limits.top_pages)
            .into_iter()
            .map(|(page, count)| PageCount { page, count })
            .collect();

        stats.traffic_sources = sources
            .ranked(self.limits.top_sources)
            .into_iter()
            .map(|(source, count)| SourceCount { source, count })
            .collect();

        stats.recent_visits = visits
            .iter()
            .rev()
            .take(self.limits.recent_visits)
            .cloned()
            .collect();

        stats
    }
}
