use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the NextQuest site.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::preview::get_preview,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::preview::GamePreview,
            crate::dto::ws::HandoffInbound,
            crate::dto::ws::HandoffOutbound,
            crate::dto::ws::VisibilityState,
            crate::dto::ws::PreviewStatus,
            crate::state::state_machine::HandoffPhase,
            crate::error::ErrorBody,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "preview", description = "Game previews for handoff pages"),
        (name = "handoff", description = "WebSocket channel driving app handoff"),
    )
)]
pub struct ApiDoc;
