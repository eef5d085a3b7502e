use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::preview::GamePreview,
    error::{AppError, ErrorBody},
    services::preview,
    state::SharedState,
};

/// Routes exposing game previews as JSON.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/preview/{id}", get(get_preview))
}

/// Fetch the preview for a game, served from the shared cache when possible.
#[utoipa::path(
    get,
    path = "/api/preview/{id}",
    tag = "preview",
    params(("id" = String, Path, description = "Game identifier as used in handoff links")),
    responses(
        (status = 200, description = "Preview found", body = GamePreview),
        (status = 404, description = "Blank identifier or unknown game", body = ErrorBody),
        (status = 502, description = "Preview API failed", body = ErrorBody),
        (status = 503, description = "Preview API not configured", body = ErrorBody)
    )
)]
pub async fn get_preview(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<GamePreview>, AppError> {
    let preview = preview::lookup_preview(&state, &id).await?;
    Ok(Json(preview))
}
