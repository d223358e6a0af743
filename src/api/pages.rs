//! Public content endpoints
//!
//! - `GET /` - latest revision of `index`
//! - `GET /:page` - latest revision of a document
//! - `GET /:page/v:n` - one explicit revision
//! - `GET /:page/:file` - an asset from `content/<page>/`

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use super::render::{render_not_found, render_page};
use super::state::AppState;
use crate::types::{ParsedContent, RevisionRequest, Visit};

/// Extensions never served as assets
const BLOCKED_ASSET_EXTENSIONS: &[&str] = &[".md", ".json"];

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Html(render_not_found())).into_response()
}

/// `v<N>` path segment as a revision number
pub fn parse_version_segment(segment: &str) -> Option<u32> {
    let digits = segment.strip_prefix('v')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Out-of-range numbers name no revision
    Some(digits.parse().unwrap_or(u32::MAX))
}

/// A single path segment that cannot escape its directory
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}

/// Client address: first `X-Forwarded-For` hop, else the peer address
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// SHA-256 hex of the client address
pub fn visitor_hash(ip: &str) -> String {
    hex::encode(Sha256::digest(ip.as_bytes()))
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn track(
    state: &AppState,
    page: String,
    content: &ParsedContent,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) {
    let visit = Visit::new(page, visitor_hash(&client_ip(headers, peer)))
        .with_version(format!("v{}", content.revision))
        .with_user_agent(header_string(headers, header::USER_AGENT))
        .with_referer(header_string(headers, header::REFERER));
    state.analytics.record(visit);
}

fn respond(
    state: &AppState,
    page_name: &str,
    tracked_as: String,
    request: RevisionRequest,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> Response {
    let Some(content) = state.resolver.get_revision(page_name, request) else {
        debug!(page = page_name, ?request, "document not found");
        return not_found();
    };

    track(state, tracked_as, &content, headers, peer);
    Html(render_page(&content, page_name, &state.config.default_theme)).into_response()
}

/// GET / - the `index` document
pub async fn serve_index(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    respond(
        &state,
        "index",
        "/".to_string(),
        RevisionRequest::Latest,
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
    )
}

/// GET /:page - latest revision
pub async fn serve_page(
    State(state): State<Arc<AppState>>,
    Path(page): Path<String>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    respond(
        &state,
        &page,
        format!("/{}", page),
        RevisionRequest::Latest,
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
    )
}

/// GET /:page/:segment - explicit revision (`v<N>`) or page asset
pub async fn serve_page_segment(
    State(state): State<Arc<AppState>>,
    Path((page, segment)): Path<(String, String)>,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request,
) -> Response {
    if let Some(number) = parse_version_segment(&segment) {
        let headers = request.headers().clone();
        return respond(
            &state,
            &page,
            format!("/{}", page),
            RevisionRequest::Exact(number),
            &headers,
            peer.map(|ConnectInfo(addr)| addr),
        );
    }

    serve_asset(&state, &page, &segment, request).await
}

async fn serve_asset(state: &AppState, page: &str, file: &str, request: Request) -> Response {
    if !is_safe_segment(page) || !is_safe_segment(file) {
        return not_found();
    }
    let lower = file.to_ascii_lowercase();
    if BLOCKED_ASSET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return not_found();
    }

    let path = state.config.content_dir.join(page).join(file);
    if !path.is_file() {
        return not_found();
    }

    match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(infallible) => match infallible {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_parse_version_segment() {
        assert_eq!(parse_version_segment("v2"), Some(2));
        assert_eq!(parse_version_segment("v10"), Some(10));
        assert_eq!(parse_version_segment("v0"), Some(0));
        assert_eq!(parse_version_segment("v99999999999"), Some(u32::MAX));
        assert_eq!(parse_version_segment("v"), None);
        assert_eq!(parse_version_segment("v2a"), None);
        assert_eq!(parse_version_segment("image.png"), None);
    }

    #[test]
    fn test_safe_segment() {
        assert!(is_safe_segment("diagram.png"));
        assert!(!is_safe_segment(".."));
        assert!(!is_safe_segment("../etc"));
        assert!(!is_safe_segment(""));
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let peer: SocketAddr = "10.0.0.1:5555".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(peer)), "10.0.0.1");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.9");
        assert_eq!(client_ip(&HeaderMap::new(), None), "unknown");
    }

    #[test]
    fn test_visitor_hash_is_sha256_hex() {
        assert_eq!(
            visitor_hash("127.0.0.1"),
            "12ca17b49af2289436f303e0166030a21e525d266e209267433801a8fd4071a0"
        );
    }
}
