use axum::{
    Router,
    extract::{Path, Query, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, SET_COOKIE, USER_AGENT},
    },
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    services::{
        page_service::{self, HandoffMode},
        session::Session,
    },
    state::{SharedState, loop_guard::GuardKey},
};

#[derive(Debug, Deserialize)]
struct InstallQuery {
    #[serde(rename = "gameId")]
    game_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GameQuery {
    id: Option<String>,
}

/// App handoff pages: `/install?gameId=` and the legacy `/game` forms.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/install", get(install_page))
        .route("/game", get(game_page))
        .route("/game/{id}", get(game_path_page))
}

async fn install_page(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<InstallQuery>,
) -> Result<Response, AppError> {
    handoff_page(&state, &headers, query.game_id.as_deref(), GuardKey::Install)
}

async fn game_page(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<GameQuery>,
) -> Result<Response, AppError> {
    handoff_page(&state, &headers, query.id.as_deref(), GuardKey::Game)
}

async fn game_path_page(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    handoff_page(&state, &headers, Some(&id), GuardKey::Game)
}

fn handoff_page(
    state: &SharedState,
    headers: &HeaderMap,
    raw_id: Option<&str>,
    key: GuardKey,
) -> Result<Response, AppError> {
    let session = Session::from_headers(headers);
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok());

    let view = page_service::prepare_handoff(state, raw_id, user_agent, &session.id, key);
    let html = page_service::render_handoff(state, &view)?;

    let status = if view.mode == HandoffMode::NotFound {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };

    let mut response = (status, Html(html)).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if let Some(cookie) = session.set_cookie() {
        response_headers.insert(SET_COOKIE, cookie);
    }
    Ok(response)
}
