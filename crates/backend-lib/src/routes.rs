// ============================
// mdwiki-backend-lib/src/routes.rs
// ============================
//! HTTP router and handlers.
//!
//! Every route except login authenticates through the session manager
//! before touching a document; an invalid or expired session is forced out
//! and answered with 401 rather than an error page.
use crate::auth::SessionCarrier;
use crate::error::AppError;
use crate::metrics as metric_keys;
use crate::pdf::PdfOptions;
use crate::search::SearchQuery;
use crate::store::Storage;
use crate::validation;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use mdwiki_common::{
    AccessLevel, ArchivePurgeRequest, LoginRequest, PagePatch, PageCreateRequest, PageSummary,
    PageUpdateRequest, PageView, SearchHit, SearchResponse, UserCreateRequest, UserUpdateRequest,
};
use metrics::{counter, gauge};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Name of the cookie carrying the opaque session token
const SESSION_COOKIE: &str = "mdwiki_session";

/// Create the HTTP router
pub fn create_router<S: Storage + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/pages", post(page_create))
        .route("/pages/{pid}", get(page_show).put(page_update))
        .route("/pages/{pid}/pdf", get(page_pdf))
        .route("/pages/{pid}/archives", get(page_archives))
        .route("/archives/{aid}", get(archive_show))
        .route("/archives", delete(archive_purge))
        .route("/index", get(page_index))
        .route("/latest", get(page_latest))
        .route("/search", get(page_search))
        .route("/users", post(user_create))
        .route("/users/me", put(user_update))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Extract the session token from the request cookies
fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}

/// Client address for rate limiting, via the reverse proxy header
fn client_ip(headers: &HeaderMap) -> IpAddr {
    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// Authenticate the request; failures force a logout server-side and
/// surface as 401.
fn require_user<S: Storage>(
    state: &AppState<S>,
    headers: &HeaderMap,
) -> Result<(String, SessionCarrier), AppError> {
    let token =
        cookie_token(headers).ok_or_else(|| AppError::Auth("no session cookie".to_string()))?;
    let carrier = state
        .carriers
        .get(&token)
        .ok_or_else(|| AppError::Auth("unknown session".to_string()))?;
    let uid = state
        .sessions
        .user_id(&carrier)
        .ok_or_else(|| AppError::Auth("session invalid or expired".to_string()))?;
    Ok((uid, carrier))
}

async fn login<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let ip = client_ip(&headers);
    if !state.login_limiter.check(ip) {
        return Err(AppError::AuthRateLimited);
    }

    if !state.users().check(&req.email, &req.password).await? {
        state.login_limiter.record_failure(ip);
        counter!(metric_keys::LOGIN_REJECTED).increment(1);
        return Err(AppError::Auth("invalid credentials".to_string()));
    }

    state.login_limiter.record_success(ip);
    let (token, carrier) = state.carriers.create();
    state.sessions.login(&carrier, &req.email, &req.timezone);
    gauge!(metric_keys::SESSION_ACTIVE).set(state.carriers.len() as f64);
    tracing::info!(uid = %req.email, "login");

    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(serde_json::json!({ "ok": true })),
    )
        .into_response())
}

async fn logout<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Response {
    if let Some(token) = cookie_token(&headers) {
        if let Some(carrier) = state.carriers.get(&token) {
            state.sessions.logout(&carrier);
        }
        state.carriers.discard(&token);
        gauge!(metric_keys::SESSION_ACTIVE).set(state.carriers.len() as f64);
    }

    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(serde_json::json!({ "ok": true })),
    )
        .into_response()
}

async fn page_show<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(pid): Path<String>,
) -> Result<Json<PageView>, AppError> {
    require_user(&state, &headers)?;
    let page = state.pages().get(&pid).await?.ok_or(AppError::PageNotFound)?;
    let html = state.renderer.to_html_fragment(&page.content);
    let author_name = state.users().to_name(&page.update.by).await?;
    Ok(Json(PageView {
        id: page.id,
        title: page.title,
        content: page.content,
        html,
        update: page.update,
        create: page.create,
        author_name,
    }))
}

async fn page_create<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<PageCreateRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (uid, _) = require_user(&state, &headers)?;
    validation::validate_title(&req.title)
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    match state.pages().add(&req.title, &req.content, &uid).await? {
        Some(pid) => Ok(Json(serde_json::json!({ "id": pid }))),
        None => Err(AppError::Conflict("page id already exists".to_string())),
    }
}

async fn page_update<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(pid): Path<String>,
    Json(req): Json<PageUpdateRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (uid, _) = require_user(&state, &headers)?;
    if let Some(title) = &req.title {
        validation::validate_title(title).map_err(|e| AppError::InvalidInput(e.to_string()))?;
    }

    let patch = PagePatch {
        title: req.title,
        content: req.content,
    };
    match state.pages().update(&pid, &uid, &patch).await? {
        Some(new_pid) => Ok(Json(serde_json::json!({ "id": new_pid }))),
        None => Err(AppError::PageNotFound),
    }
}

async fn page_pdf<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(pid): Path<String>,
) -> Result<Response, AppError> {
    require_user(&state, &headers)?;
    let page = state.pages().get(&pid).await?.ok_or(AppError::PageNotFound)?;

    let html = state.renderer.to_html_document(&page.title, &page.content);
    let bytes = state.pdf.render(&html, &PdfOptions::default()).await?;

    let disposition = format!(
        "attachment; filename*=UTF-8''{}.pdf",
        percent_encode(&page.title)
    );
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn page_archives<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(pid): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_user(&state, &headers)?;
    let entries = state.archive().get_by_page(&pid).await?;
    Ok(Json(serde_json::json!({ "page_id": pid, "entries": entries })))
}

async fn archive_show<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(aid): Path<String>,
) -> Result<Json<mdwiki_common::ArchiveEntry>, AppError> {
    require_user(&state, &headers)?;
    let entry = state
        .archive()
        .get(&aid)
        .await?
        .ok_or(AppError::ArchiveNotFound)?;
    Ok(Json(entry))
}

async fn archive_purge<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<ArchivePurgeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_user(&state, &headers)?;
    state.archive().remove_many(&req.archive_ids).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn page_index<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<BTreeMap<String, Vec<PageSummary>>>, AppError> {
    require_user(&state, &headers)?;
    let index = state.pages().get_all_as_index().await?;
    let index = index
        .into_iter()
        .map(|(key, pages)| (key, pages.iter().map(PageSummary::from).collect()))
        .collect();
    Ok(Json(index))
}

async fn page_latest<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<PageSummary>>, AppError> {
    require_user(&state, &headers)?;
    let latest = state
        .pages()
        .get_latest(state.settings.wiki.latest_count)
        .await?;
    Ok(Json(latest.iter().map(PageSummary::from).collect()))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn page_search<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    require_user(&state, &headers)?;

    let started = Instant::now();
    let query = SearchQuery::parse(&params.q);
    let pages = state.pages().get_all().await?;
    let results = state.search_engine().search(pages, &query).await;
    let seconds = started.elapsed().as_secs_f64();

    let hits: Vec<SearchHit> = results
        .into_iter()
        .map(|scored| SearchHit {
            id: scored.page.id,
            title: scored.page.title,
            points: scored.points,
        })
        .collect();

    Ok(Json(SearchResponse {
        count: hits.len(),
        results: hits,
        seconds,
        query: params.q,
    }))
}

async fn user_create<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<UserCreateRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_user(&state, &headers)?;

    validation::validate_email(&req.email).map_err(|e| AppError::InvalidInput(e.to_string()))?;
    if req.name.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            "name and password must not be empty".to_string(),
        ));
    }
    validation::confirm_password(&req.password, &req.password_confirm)
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;
    let level = match &req.level {
        Some(level) => validation::parse_access_level(level)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?,
        None => AccessLevel::Writer,
    };

    if !state
        .users()
        .add(&req.email, &req.name, &req.password, level)
        .await?
    {
        return Err(AppError::Conflict("account already exists".to_string()));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn user_update<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<UserUpdateRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (uid, _) = require_user(&state, &headers)?;

    validation::confirm_password(&req.password, &req.password_confirm)
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    // password change only; the access level is an admin-side decision
    state.users().update(&uid, Some(&req.password), None).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// RFC 5987 percent-encoding for the PDF download filename
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            },
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_token_finds_session_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "other=1; mdwiki_session=abc-123; theme=dark".parse().unwrap(),
        );
        assert_eq!(cookie_token(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn cookie_token_missing_returns_none() {
        let headers = HeaderMap::new();
        assert_eq!(cookie_token(&headers), None);
    }

    #[test]
    fn percent_encode_keeps_ascii_and_escapes_the_rest() {
        assert_eq!(percent_encode("Alpha-Notes_1.0"), "Alpha-Notes_1.0");
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("メモ"), "%E3%83%A1%E3%83%A2");
    }
}
