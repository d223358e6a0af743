//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use super::state::AppState;
use super::{admin, pages};

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let themes = ServeDir::new(&state.config.themes_dir);

    Router::new()
        // Admin area
        .route("/admin", get(admin::dashboard))
        .route("/admin/login", get(admin::login_page).post(admin::handle_login))
        .route("/admin/logout", post(admin::handle_logout))
        .route("/admin/api/stats", get(admin::stats_json))
        // Health check
        .route("/health", get(health_check))
        // Theme stylesheets
        .nest_service("/themes", themes)
        // Content
        .route("/", get(pages::serve_index))
        .route("/:page", get(pages::serve_page))
        .route("/:page/:segment", get(pages::serve_page_segment))
        .fallback(|| async { pages::not_found() })
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
