//! Admin endpoints
//!
//! - `GET /admin/login` - login form
//! - `POST /admin/login` - password check, starts a session
//! - `POST /admin/logout` - ends the session
//! - `GET /admin` - dashboard (session required)
//! - `GET /admin/api/stats` - aggregate statistics as JSON (session required)

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::auth::{clear_session_cookie, cookie_value, session_cookie};
use super::render::{render_dashboard, render_login};
use super::session::SESSION_COOKIE;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

/// Whether the request carries a live session, extending it if so
async fn authenticated(state: &AppState, headers: &HeaderMap) -> bool {
    match cookie_value(headers, SESSION_COOKIE) {
        Some(id) => state.sessions.touch(&id).await,
        None => false,
    }
}

/// GET /admin/login
pub async fn login_page(Query(params): Query<LoginParams>) -> Html<String> {
    Html(render_login(params.error.is_some()))
}

/// POST /admin/login
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    if !state.auth.verify(&form.password) {
        warn!("failed admin login");
        return Redirect::to("/admin/login?error=1").into_response();
    }

    let session_id = state.sessions.create_session().await;
    info!("admin logged in");
    (
        [(
            header::SET_COOKIE,
            session_cookie(&session_id, state.sessions.ttl().as_secs()),
        )],
        Redirect::to("/admin"),
    )
        .into_response()
}

/// POST /admin/logout
pub async fn handle_logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(id) = cookie_value(&headers, SESSION_COOKIE) {
        state.sessions.remove_session(&id).await;
    }
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to("/admin/login"),
    )
        .into_response()
}

/// GET /admin
pub async fn dashboard(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if !authenticated(&state, &headers).await {
        return Redirect::to("/admin/login").into_response();
    }

    let stats = state.analytics.compute_stats();
    let documents = state.resolver.list_all_documents();
    Html(render_dashboard(&stats, &documents)).into_response()
}

/// GET /admin/api/stats
pub async fn stats_json(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if !authenticated(&state, &headers).await {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(state.analytics.compute_stats()).into_response()
}
