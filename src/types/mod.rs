//! Data types shared by the content resolver, the analytics buffer and the
//! serving layer.

mod revision;
mod stats;
mod visit;

pub use revision::{Metadata, ParsedContent, RevisionRef, RevisionRequest};
pub use stats::{AggregateStats, AudienceSplit, PageCount, PageViews, SourceCount};
pub use visit::{AnalyticsLog, Visit, VisitEvent};
