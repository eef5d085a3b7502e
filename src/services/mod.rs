/// Static page copy.
pub mod content;
/// OpenAPI documentation generation.
pub mod documentation;
/// Per-page-view handoff WebSocket sessions.
pub mod handoff_service;
/// Health check service.
pub mod health_service;
/// Page rendering and handoff view selection.
pub mod page_service;
/// Game preview fetching and caching.
pub mod preview;
/// Browser-session cookie handling.
pub mod session;
/// Background cleanup of session-scoped state.
pub mod session_sweeper;
