//! Server configuration
//!
//! Read from a JSON file (default `./config.json`, or the path in
//! `MDCMS_CONFIG`), then overridden from the environment:
//!
//! ```bash
//! MDCMS_HOST=0.0.0.0
//! MDCMS_PORT=8080
//! MDCMS_ADMIN_PASSWORD=change-me
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::analytics::AnalyticsConfig;
use crate::error::{CmsError, CmsResult};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "MDCMS_CONFIG";

/// Admin login settings
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub password: String,
}

/// Top-level server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,
    #[serde(default = "default_themes_dir")]
    pub themes_dir: PathBuf,
    #[serde(default = "default_analytics_file")]
    pub analytics_file: PathBuf,
    #[serde(default = "default_theme")]
    pub default_theme: String,
    /// Admin session lifetime, extended on every authenticated request
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    pub admin: AdminConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_themes_dir() -> PathBuf {
    PathBuf::from("themes")
}

fn default_analytics_file() -> PathBuf {
    PathBuf::from("analytics.json")
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_session_ttl() -> u64 {
    3600
}

impl ServerConfig {
    /// A config rooted at `base_dir` with defaults for everything else
    pub fn new<P: AsRef<Path>>(base_dir: P, admin_password: impl Into<String>) -> Self {
        let base = base_dir.as_ref();
        Self {
            host: default_host(),
            port: default_port(),
            content_dir: base.join(default_content_dir()),
            themes_dir: base.join(default_themes_dir()),
            analytics_file: base.join(default_analytics_file()),
            default_theme: default_theme(),
            session_ttl_secs: default_session_ttl(),
            admin: AdminConfig {
                password: admin_password.into(),
            },
            analytics: AnalyticsConfig::default(),
        }
    }

    /// Parse JSON config text; relative paths resolve against `base_dir`
    pub fn from_json(json: &str, base_dir: &Path) -> CmsResult<Self> {
        let config = Self::parse(json, base_dir)?;
        config.validate()?;
        Ok(config)
    }

    fn parse(json: &str, base_dir: &Path) -> CmsResult<Self> {
        let mut config: ServerConfig = serde_json::from_str(json)
            .map_err(|e| CmsError::Config(format!("invalid config: {}", e)))?;
        config.resolve_paths(base_dir);
        Ok(config)
    }

    /// Load the config file named by `MDCMS_CONFIG` (or `./config.json`)
    /// and apply environment overrides
    pub fn load() -> CmsResult<Self> {
        let path = env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.json"));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> CmsResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            CmsError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // Validated only after the environment has had its say
        let mut config = Self::parse(&json, base_dir)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        for path in [
            &mut self.content_dir,
            &mut self.themes_dir,
            &mut self.analytics_file,
        ] {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
    }

    fn apply_env_overrides(&mut self) -> CmsResult<()> {
        if let Ok(host) = env::var("MDCMS_HOST") {
            self.host = host;
        }
        if let Ok(port) = env::var("MDCMS_PORT") {
            self.port = port
                .parse()
                .map_err(|_| CmsError::Config(format!("MDCMS_PORT is not a port: {}", port)))?;
        }
        if let Ok(password) = env::var("MDCMS_ADMIN_PASSWORD") {
            self.admin.password = password;
        }
        Ok(())
    }

    fn validate(&self) -> CmsResult<()> {
        if self.admin.password.is_empty() {
            return Err(CmsError::Config("admin.password must not be empty".to_string()));
        }
        Ok(())
    }

    /// `host:port` for binding the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
