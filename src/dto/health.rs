use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status, always "ok" while the process serves requests.
    pub status: String,
    /// Whether a preview API is configured.
    pub previews_configured: bool,
    /// Handoff pages waiting for their socket.
    pub pending_handoffs: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(previews_configured: bool, pending_handoffs: usize) -> Self {
        Self {
            status: "ok".to_string(),
            previews_configured,
            pending_handoffs,
        }
    }
}
