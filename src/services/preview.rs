//! Best-effort game previews fetched from the external preview API.
//!
//! Failures never reach the handoff flow: callers turn them into a soft
//! [`PreviewState::Error`] and carry on.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use futures::future::BoxFuture;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    config::AppConfig,
    dto::preview::GamePreview,
    error::ServiceError,
    state::{SharedState, game_id::GameId},
};

/// Failures while loading a preview.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// No preview API base URL is configured.
    #[error("preview endpoint is not configured")]
    NotConfigured,
    /// The request was cancelled before it completed.
    #[error("preview request aborted")]
    Aborted,
    /// Building the HTTP client failed.
    #[error("failed to build preview client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The configured base URL cannot carry path segments.
    #[error("invalid preview base URL `{url}`")]
    InvalidBaseUrl { url: String },
    /// The request could not be sent or its body not read.
    #[error("preview request for `{id}` failed")]
    Transport {
        id: String,
        #[source]
        source: reqwest::Error,
    },
    /// The API answered with a non-success status.
    #[error("unexpected preview response status {status} for `{id}`")]
    Status { id: String, status: StatusCode },
    /// The body lacks an id or a string name.
    #[error("malformed preview body for `{id}`: {reason}")]
    Malformed { id: String, reason: &'static str },
}

/// Where previews come from on a cache miss.
pub trait PreviewSource: Send + Sync {
    /// Issue a single request for `id`.
    fn fetch(&self, id: &GameId) -> BoxFuture<'static, Result<GamePreview, PreviewError>>;
}

/// [`PreviewSource`] calling `GET {base}/preview/games/{id}`.
#[derive(Clone, Debug)]
pub struct HttpPreviewSource {
    client: Client,
    base_url: Url,
}

impl HttpPreviewSource {
    /// Build a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PreviewError> {
        let invalid = || PreviewError::InvalidBaseUrl {
            url: base_url.to_string(),
        };
        let parsed = Url::parse(base_url).map_err(|_| invalid())?;
        if parsed.cannot_be_a_base() {
            return Err(invalid());
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| PreviewError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// `{base}/preview/games/{id}` with the id percent-encoded as one segment.
    fn preview_url(&self, id: &GameId) -> Result<Url, PreviewError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PreviewError::InvalidBaseUrl {
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(["preview", "games", id.as_str()]);
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }
}

impl PreviewSource for HttpPreviewSource {
    fn fetch(&self, id: &GameId) -> BoxFuture<'static, Result<GamePreview, PreviewError>> {
        let url = self.preview_url(id);
        let client = self.client.clone();
        let id = id.to_string();

        Box::pin(async move {
            let response = client
                .get(url?)
                .send()
                .await
                .map_err(|source| PreviewError::Transport {
                    id: id.clone(),
                    source,
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(PreviewError::Status { id, status });
            }

            let body = response
                .json::<Value>()
                .await
                .map_err(|source| PreviewError::Transport {
                    id: id.clone(),
                    source,
                })?;

            GamePreview::from_json(&body).map_err(|shape| PreviewError::Malformed {
                id,
                reason: shape.reason(),
            })
        })
    }
}

/// Cached, cancellable preview loading shared by every page view.
pub struct PreviewFetcher {
    source: Option<Arc<dyn PreviewSource>>,
    cache: DashMap<GameId, GamePreview>,
    development: bool,
}

impl PreviewFetcher {
    /// Create a fetcher. Without a source every miss fails with [`PreviewError::NotConfigured`].
    pub fn new(source: Option<Arc<dyn PreviewSource>>, development: bool) -> Self {
        Self {
            source,
            cache: DashMap::new(),
            development,
        }
    }

    /// Build the HTTP-backed fetcher described by the configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let source = config.preview_api_url().and_then(|base_url| {
            match HttpPreviewSource::new(base_url, config.preview_timeout()) {
                Ok(source) => Some(Arc::new(source) as Arc<dyn PreviewSource>),
                Err(err) => {
                    warn!(error = %err, "preview client unavailable; previews disabled");
                    None
                }
            }
        });
        Self::new(source, config.is_development())
    }

    /// Whether a preview API is configured.
    pub fn is_configured(&self) -> bool {
        self.source.is_some()
    }

    /// Cached preview for `id`, without touching the network.
    pub fn cached(&self, id: &GameId) -> Option<GamePreview> {
        self.cache.get(id).map(|entry| entry.value().clone())
    }

    /// Return the cached preview or fetch it, giving up as soon as `cancel` fires.
    pub async fn fetch(
        &self,
        id: &GameId,
        cancel: &CancellationToken,
    ) -> Result<GamePreview, PreviewError> {
        if let Some(hit) = self.cached(id) {
            return Ok(hit);
        }

        let Some(source) = self.source.as_ref() else {
            let err = PreviewError::NotConfigured;
            self.report(id, &err);
            return Err(err);
        };

        let request = source.fetch(id);
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PreviewError::Aborted),
            result = request => result,
        };

        match result {
            Ok(preview) => {
                self.cache.insert(id.clone(), preview.clone());
                Ok(preview)
            }
            Err(err) => {
                self.report(id, &err);
                Err(err)
            }
        }
    }

    fn report(&self, id: &GameId, err: &PreviewError) {
        if self.development {
            warn!(game_id = %id, error = %err, "preview fetch failed");
        } else {
            debug!(game_id = %id, error = %err, "preview fetch failed");
        }
    }
}

/// What the page shows in the preview slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewState {
    /// A request is in flight.
    Loading,
    /// Preview available.
    Success(GamePreview),
    /// Fetch failed; the page shows no preview.
    Error,
}

/// A started preview load: its generation and the token that aborts it.
#[derive(Debug, Clone)]
pub struct PreviewTicket {
    /// Monotonic load number; only the latest is applied.
    pub generation: u64,
    /// Cancelled when a newer load starts or the page goes away.
    pub token: CancellationToken,
}

/// Outcome of a load tagged with its generation.
#[derive(Debug)]
pub struct PreviewResult {
    /// Generation of the load that produced this result.
    pub generation: u64,
    /// Fetch outcome.
    pub outcome: Result<GamePreview, PreviewError>,
}

/// Tracks the latest preview load so late responses for older identifiers are dropped.
#[derive(Debug, Default)]
pub struct PreviewTracker {
    generation: u64,
    current: Option<CancellationToken>,
}

impl PreviewTracker {
    /// Start a new load, aborting the previous one.
    pub fn begin(&mut self) -> PreviewTicket {
        self.cancel();
        self.generation += 1;
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        PreviewTicket {
            generation: self.generation,
            token,
        }
    }

    /// Abort the current load, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }

    /// State to apply for `result`, or `None` when it is stale or aborted.
    pub fn resolve(&self, result: PreviewResult) -> Option<PreviewState> {
        let live = self
            .current
            .as_ref()
            .is_some_and(|token| !token.is_cancelled());
        if result.generation != self.generation || !live {
            return None;
        }

        match result.outcome {
            Ok(preview) => Some(PreviewState::Success(preview)),
            Err(PreviewError::Aborted) => None,
            Err(_) => Some(PreviewState::Error),
        }
    }
}

/// Run a load in the background and report its outcome on `tx`.
pub fn spawn_preview(
    fetcher: Arc<PreviewFetcher>,
    id: GameId,
    ticket: PreviewTicket,
    tx: mpsc::UnboundedSender<PreviewResult>,
) {
    tokio::spawn(async move {
        let outcome = fetcher.fetch(&id, &ticket.token).await;
        let _ = tx.send(PreviewResult {
            generation: ticket.generation,
            outcome,
        });
    });
}

/// Load the preview for a raw identifier on behalf of the JSON endpoint.
pub async fn lookup_preview(
    state: &SharedState,
    raw_id: &str,
) -> Result<GamePreview, ServiceError> {
    let id = GameId::parse(Some(raw_id))
        .map_err(|err| ServiceError::NotFound(err.to_string()))?;
    let preview = state
        .previews()
        .fetch(&id, &CancellationToken::new())
        .await?;
    Ok(preview)
}
