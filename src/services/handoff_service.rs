use std::{sync::Arc, time::Duration};

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    dto::ws::{HandoffInbound, HandoffOutbound, PreviewStatus, VisibilityState},
    services::preview::{PreviewFetcher, PreviewResult, PreviewState, PreviewTracker, spawn_preview},
    state::{
        HandoffTicket, SharedState,
        game_id::GameId,
        handoff::{HandoffController, Navigator},
        loop_guard::SessionLoopGuard,
        scheduler::{TimerId, TokioScheduler},
    },
};

const HELLO_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle the full lifecycle of one handoff page's WebSocket.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(HELLO_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("handoff hello timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let ticket_id = match HandoffInbound::from_json_str(initial_message.as_str()) {
        Ok(HandoffInbound::Hello { ticket }) => ticket,
        Ok(_) => {
            warn!("first handoff message was not hello");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Err(err) => {
            warn!(error = %err, "failed to parse handoff message");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let Some(ticket) = state.claim_ticket(&ticket_id) else {
        warn!(ticket = %ticket_id, "unknown or expired handoff ticket");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    };

    info!(
        game_id = %ticket.game_id,
        platform = ?ticket.device.platform,
        "handoff page connected"
    );

    let (mut session, mut channels) = HandoffSession::open(&state, ticket, outbound_tx.clone());

    loop {
        tokio::select! {
            message = receiver.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    match HandoffInbound::from_json_str(text.as_str()) {
                        Ok(inbound) => session.handle_inbound(inbound),
                        Err(err) => warn!(error = %err, "failed to parse handoff message"),
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    let _ = outbound_tx.send(Message::Pong(payload));
                }
                Some(Ok(Message::Close(frame))) => {
                    let _ = outbound_tx.send(Message::Close(frame));
                    break;
                }
                Some(Ok(Message::Binary(_))) | Some(Ok(Message::Pong(_))) => {}
                Some(Err(err)) => {
                    warn!(error = %err, "websocket error");
                    break;
                }
                None => break,
            },
            Some(timer) = channels.timers.recv() => session.handle_timer(timer),
            Some(result) = channels.previews.recv() => session.handle_preview(result),
        }
    }

    session.close();
    info!(game_id = %session.game_id, phase = ?session.controller.phase(), "handoff page disconnected");
    drop(session);

    finalize(writer_task, outbound_tx).await;
}

/// Serialize a payload and push it onto the socket writer. Returns `false` once the writer is gone.
fn send_message(tx: &mpsc::UnboundedSender<Message>, message: &HandoffOutbound) -> bool {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize handoff message `{message:?}`");
            return true;
        }
    };
    tx.send(Message::Text(payload.into())).is_ok()
}

/// [`Navigator`] turning controller commands into socket messages for the relay script.
struct WsNavigator {
    tx: mpsc::UnboundedSender<Message>,
}

impl Navigator for WsNavigator {
    fn open_app(&mut self, url: &str) {
        if !send_message(&self.tx, &HandoffOutbound::OpenApp { url: url.into() }) {
            debug!("writer closed before app launch");
        }
    }

    fn redirect_to_store(&mut self, url: &str) {
        if !send_message(&self.tx, &HandoffOutbound::Redirect { url: url.into() }) {
            debug!("writer closed before store redirect");
        }
    }
}

/// Event sources a session reacts to besides inbound frames.
pub(crate) struct SessionChannels {
    pub(crate) timers: mpsc::UnboundedReceiver<TimerId>,
    pub(crate) previews: mpsc::UnboundedReceiver<PreviewResult>,
}

/// One page view's controller, preview slot and outbound channel.
pub(crate) struct HandoffSession {
    game_id: GameId,
    controller: HandoffController<TokioScheduler, WsNavigator, SessionLoopGuard>,
    previews: Arc<PreviewFetcher>,
    tracker: PreviewTracker,
    preview_tx: mpsc::UnboundedSender<PreviewResult>,
    outbound: mpsc::UnboundedSender<Message>,
    last_version: Option<usize>,
}

impl HandoffSession {
    /// Run the entry step and start loading the preview.
    pub(crate) fn open(
        state: &SharedState,
        ticket: HandoffTicket,
        outbound: mpsc::UnboundedSender<Message>,
    ) -> (Self, SessionChannels) {
        let guard = state.guards().guard(&ticket.session_id, ticket.guard_key);
        let (scheduler, timers) = TokioScheduler::new();
        let (preview_tx, previews) = mpsc::unbounded_channel();

        let controller = HandoffController::new(
            ticket.game_id.clone(),
            ticket.device,
            state.handoff_settings().clone(),
            scheduler,
            WsNavigator {
                tx: outbound.clone(),
            },
            guard,
        );

        let mut session = Self {
            game_id: ticket.game_id,
            controller,
            previews: state.previews().clone(),
            tracker: PreviewTracker::default(),
            preview_tx,
            outbound,
            last_version: None,
        };

        let entry = session.controller.start();
        debug!(game_id = %session.game_id, ?entry, "handoff entry resolved");
        session.sync_phase();
        session.load_preview();

        (session, SessionChannels { timers, previews })
    }

    pub(crate) fn handle_inbound(&mut self, message: HandoffInbound) {
        match message {
            HandoffInbound::Visibility {
                state: VisibilityState::Hidden,
            } => self.controller.on_visibility_hidden(),
            HandoffInbound::Visibility {
                state: VisibilityState::Visible,
            } => debug!(game_id = %self.game_id, "handoff page visible again"),
            HandoffInbound::Retry => self.controller.retry(),
            HandoffInbound::Store => self.controller.go_to_store(),
            HandoffInbound::Hello { .. } => {
                warn!(game_id = %self.game_id, "ignoring duplicate hello message");
            }
            HandoffInbound::Unknown => {
                debug!(game_id = %self.game_id, "ignoring unknown handoff message");
            }
        }
        self.sync_phase();
    }

    pub(crate) fn handle_timer(&mut self, timer: TimerId) {
        self.controller.on_timer_fired(timer);
        self.sync_phase();
    }

    pub(crate) fn handle_preview(&mut self, result: PreviewResult) {
        let message = match self.tracker.resolve(result) {
            Some(PreviewState::Success(preview)) => HandoffOutbound::Preview {
                status: PreviewStatus::Success,
                preview: Some(preview),
            },
            Some(PreviewState::Error) => HandoffOutbound::Preview {
                status: PreviewStatus::Error,
                preview: None,
            },
            Some(PreviewState::Loading) | None => return,
        };
        send_message(&self.outbound, &message);
    }

    /// Cancel the pending timer and abort the preview fetch.
    pub(crate) fn close(&mut self) {
        self.controller.teardown();
        self.tracker.cancel();
    }

    fn load_preview(&mut self) {
        if let Some(preview) = self.previews.cached(&self.game_id) {
            send_message(
                &self.outbound,
                &HandoffOutbound::Preview {
                    status: PreviewStatus::Success,
                    preview: Some(preview),
                },
            );
            return;
        }

        send_message(
            &self.outbound,
            &HandoffOutbound::Preview {
                status: PreviewStatus::Loading,
                preview: None,
            },
        );
        let ticket = self.tracker.begin();
        spawn_preview(
            self.previews.clone(),
            self.game_id.clone(),
            ticket,
            self.preview_tx.clone(),
        );
    }

    fn sync_phase(&mut self) {
        let snapshot = self.controller.snapshot();
        if self.last_version == Some(snapshot.version) {
            return;
        }
        self.last_version = Some(snapshot.version);
        send_message(
            &self.outbound,
            &HandoffOutbound::Phase {
                phase: snapshot.phase,
            },
        );
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
