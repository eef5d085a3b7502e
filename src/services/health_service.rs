use tracing::debug;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness together with the preview configuration.
pub fn health_status(state: &SharedState) -> HealthResponse {
    let previews_configured = state.previews().is_configured();
    if !previews_configured {
        debug!("preview API not configured; handoff pages render without previews");
    }
    HealthResponse::ok(previews_configured, state.pending_tickets())
}
