//! Visit telemetry types
//!
//! `Visit` is what a request handler knows about a page view. The buffer
//! stamps it with a capture time, turning it into an immutable `VisitEvent`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A page view as reported by the serving layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub page: String,
    pub version: Option<String>,
    pub ip_hash: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

impl Visit {
    pub fn new(page: impl Into<String>, ip_hash: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            version: None,
            ip_hash: ip_hash.into(),
            user_agent: None,
            referer: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_referer(mut self, referer: Option<String>) -> Self {
        self.referer = referer;
        self
    }

    /// Attach the capture timestamp
    pub fn stamp(self, timestamp: DateTime<Utc>) -> VisitEvent {
        VisitEvent {
            page: self.page,
            version: self.version,
            ip_hash: self.ip_hash,
            user_agent: self.user_agent,
            referer: self.referer,
            timestamp,
        }
    }
}

/// A recorded visit, as stored in the analytics log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitEvent {
    pub page: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub ip_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The persisted analytics document: `{"visits": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsLog {
    #[serde(default)]
    pub visits: Vec<VisitEvent>,
}
