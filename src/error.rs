//! Error types for mdcms
//!
//! A single error enum shared by the content, analytics and serving layers.
//! Most read paths in the core never surface these: they degrade to empty
//! or not-found results instead.

use thiserror::Error;

/// Result type alias using CmsError
pub type CmsResult<T> = std::result::Result<T, CmsError>;

/// Unified error type for mdcms operations
#[derive(Debug, Error)]
pub enum CmsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

impl From<bcrypt::BcryptError> for CmsError {
    fn from(e: bcrypt::BcryptError) -> Self {
        CmsError::Auth(e.to_string())
    }
}
