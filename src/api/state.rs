//! Shared application state
//!
//! Everything a handler needs, created once at startup and handed to the
//! router behind an `Arc`.

use std::sync::Arc;
use std::time::Duration;

use crate::analytics::Analytics;
use crate::config::ServerConfig;
use crate::content::{FsContentSource, RevisionResolver};
use crate::error::CmsResult;

use super::auth::AdminAuth;
use super::session::SessionManager;

pub struct AppState {
    pub config: ServerConfig,
    pub resolver: RevisionResolver<FsContentSource>,
    pub analytics: Arc<Analytics>,
    pub sessions: SessionManager,
    pub auth: AdminAuth,
}

impl AppState {
    /// Build state from config, opening the analytics log
    pub fn new(config: ServerConfig) -> CmsResult<Self> {
        let auth = AdminAuth::new(&config.admin.password)?;
        Self::with_auth(config, auth)
    }

    /// Build state with a prepared password check
    pub fn with_auth(config: ServerConfig, auth: AdminAuth) -> CmsResult<Self> {
        let analytics = Analytics::open(&config.analytics_file, config.analytics.clone())?;
        Ok(Self {
            resolver: RevisionResolver::new(FsContentSource::new(&config.content_dir)),
            analytics: Arc::new(analytics),
            sessions: SessionManager::new(Duration::from_secs(config.session_ttl_secs)),
            auth,
            config,
        })
    }
}
