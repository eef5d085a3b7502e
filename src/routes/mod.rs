use axum::Router;
use tower_http::services::ServeDir;

use crate::{config::static_dir, state::SharedState};

pub mod docs;
pub mod handoff;
pub mod health;
pub mod pages;
pub mod preview;
pub mod websocket;

/// Compose all route trees, wiring in shared state, static assets and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    pages::router()
        .merge(handoff::router())
        .merge(websocket::router())
        .merge(preview::router())
        .merge(health::router())
        .merge(docs::router())
        .nest_service("/static", ServeDir::new(static_dir()))
        .with_state(state)
}
