//! MDCMS - markdown content server
//!
//! Serves versioned markdown documents from a content directory and keeps
//! durable visit analytics.
//!
//! # Modules
//!
//! - `content`: revision resolution over the content directory
//! - `analytics`: buffered visit log with periodic atomic flush and stats
//! - `api`: axum routes, page rendering and admin sessions
//! - `types`: revisions, visits and aggregate statistics
//! - `config`: JSON config file with environment overrides
//! - `utils`: atomic file replacement and calendar helpers
//!
//! # Example
//!
//! ```no_run
//! use mdcms::content::{FsContentSource, RevisionResolver};
//! use mdcms::types::RevisionRequest;
//!
//! let resolver = RevisionResolver::new(FsContentSource::new("content"));
//! if let Some(page) = resolver.get_revision("guide", RevisionRequest::Latest) {
//!     println!("guide is at v{} of {}", page.revision, page.revisions.len());
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod config;
pub mod content;
pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use analytics::{Analytics, AnalyticsConfig, FlushOutcome};
pub use api::{create_router, AppState};
pub use config::ServerConfig;
pub use content::{ContentSource, FsContentSource, RevisionResolver};
pub use error::{CmsError, CmsResult};
pub use types::{AggregateStats, ParsedContent, RevisionRef, RevisionRequest, Visit, VisitEvent};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
