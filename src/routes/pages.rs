use axum::{Router, extract::State, response::Html, routing::get};

use crate::{error::AppError, services::page_service, state::SharedState};

/// Marketing and legal pages.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(home))
        .route("/changelog", get(changelog))
        .route("/privacy", get(privacy))
        .route("/terms", get(terms))
        .route("/support", get(support))
}

async fn home(State(state): State<SharedState>) -> Result<Html<String>, AppError> {
    Ok(Html(page_service::render_home(&state)?))
}

async fn changelog() -> Result<Html<String>, AppError> {
    Ok(Html(page_service::render_changelog()?))
}

async fn privacy() -> Result<Html<String>, AppError> {
    Ok(Html(page_service::render_privacy()?))
}

async fn terms() -> Result<Html<String>, AppError> {
    Ok(Html(page_service::render_terms()?))
}

async fn support() -> Result<Html<String>, AppError> {
    Ok(Html(page_service::render_support()?))
}
