//! WebSocket session to the speech service.
//!
//! A single spawned task owns the socket and multiplexes outbound frames
//! (fed through a bounded channel) with inbound result events. Collaborators
//! never touch the socket directly: capture holds a [`FrameSender`], the
//! orchestrator holds the [`TransportSession`] handle.

use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use super::messages::{
    AuthPayload, EventEnvelope, SpeechResult, EVENT_SPEECH_RECOGNIZED, EVENT_STREAM_END,
};
use super::TransportError;
use crate::audio::WireFrame;
use crate::config::Config;
use crate::session::{ConnectionState, SessionState};

/// Handler for result events arriving on the socket, registered once at
/// connect time.
pub trait ResultHandler: Send + Sync {
    fn on_speech_result(&self, result: &SpeechResult);

    fn on_unknown_event(&self, _event: &str) {}
}

enum Outbound {
    Audio(WireFrame),
    StreamEnd,
    Close,
}

/// How many frames may wait for the socket before new ones are dropped.
/// Backpressure policy is drop-not-queue: liveness over fidelity.
const OUTBOUND_QUEUE: usize = 64;

/// Non-blocking hand-off into the socket task. Cloneable, safe to call
/// from the audio callback thread.
#[derive(Clone)]
pub struct FrameSender {
    tx: mpsc::Sender<Outbound>,
}

impl FrameSender {
    /// Returns false when the frame was dropped, either because the
    /// backlog is full or the session is gone. Never waits.
    pub fn send(&self, frame: WireFrame) -> bool {
        self.tx.try_send(Outbound::Audio(frame)).is_ok()
    }
}

pub struct TransportSession {
    outbound: mpsc::Sender<Outbound>,
    task: Option<JoinHandle<()>>,
    state: Arc<SessionState>,
}

impl TransportSession {
    /// Connects to the service: WebSocket handshake against the endpoint's
    /// `/listen` namespace with the recognition options as query
    /// parameters, then the auth payload as the first message. Only after
    /// both succeed does ConnectionState become Connected.
    pub async fn connect(
        config: &Config,
        state: Arc<SessionState>,
        handler: Arc<dyn ResultHandler>,
    ) -> Result<Self, TransportError> {
        let url = build_url(config)?;
        info!(endpoint = %url, "connecting to speech service");
        state.set_connection(ConnectionState::Connecting);

        let (mut socket, _response) = match connect_async(url.as_str()).await {
            Ok(ok) => ok,
            Err(e) => {
                state.set_connection(ConnectionState::Disconnected);
                return Err(TransportError::Handshake(e.to_string()));
            }
        };

        let auth = serde_json::to_string(&AuthPayload {
            token: &config.server.api_key,
        })
        .map_err(|e| TransportError::Auth(e.to_string()))?;
        if let Err(e) = socket.send(Message::Text(auth)).await {
            state.set_connection(ConnectionState::Disconnected);
            return Err(TransportError::Auth(e.to_string()));
        }

        state.set_connection(ConnectionState::Connected);
        info!("connected to speech service");

        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
        let task = tokio::spawn(run_socket(socket, rx, state.clone(), handler));

        Ok(Self {
            outbound: tx,
            task: Some(task),
            state,
        })
    }

    pub fn frame_sender(&self) -> FrameSender {
        FrameSender {
            tx: self.outbound.clone(),
        }
    }

    /// Ordered teardown: `streamEnd` (only while still connected), then
    /// close, then join the socket task. Every step is best-effort; the
    /// session is consumed either way.
    pub async fn shutdown(mut self) {
        if self.state.connection() == ConnectionState::Connected
            && self.outbound.send(Outbound::StreamEnd).await.is_err()
        {
            debug!("socket task already gone, skipping streamEnd");
        }

        let _ = self.outbound.send(Outbound::Close).await;

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "socket task panicked");
            }
        }

        self.state.set_connection(ConnectionState::Disconnected);
        info!("disconnected from speech service");
    }
}

/// Endpoint + `/listen` namespace + recognition options as a query string.
fn build_url(config: &Config) -> Result<Url, TransportError> {
    let mut url = Url::parse(&config.server.url)?;
    url.set_path("/listen");
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in config.stt.to_query_pairs() {
            pairs.append_pair(&key, &value);
        }
    }
    Ok(url)
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn run_socket(
    socket: Socket,
    mut outbound: mpsc::Receiver<Outbound>,
    state: Arc<SessionState>,
    handler: Arc<dyn ResultHandler>,
) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(Outbound::Audio(frame)) => {
                    // Fire-and-forget: a failed frame is logged and skipped,
                    // never retried, and does not end the session.
                    if let Err(e) = sink.send(Message::Binary(frame.bytes)).await {
                        warn!(error = %e, "failed to send audio frame");
                    }
                }
                Some(Outbound::StreamEnd) => {
                    let end = serde_json::json!({ "event": EVENT_STREAM_END }).to_string();
                    match sink.send(Message::Text(end)).await {
                        Ok(()) => info!("sent streamEnd"),
                        Err(e) => warn!(error = %e, "failed to send streamEnd"),
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => dispatch(&text, handler.as_ref()),
                Some(Ok(Message::Close(_))) => {
                    info!("server closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "websocket error");
                    break;
                }
                None => {
                    info!("connection closed");
                    break;
                }
            },
        }
    }

    state.set_connection(ConnectionState::Disconnected);
}

/// Decodes one text event and routes it. Malformed or unknown events are
/// logged and ignored; the connection always survives them.
fn dispatch(text: &str, handler: &dyn ResultHandler) {
    let envelope: EventEnvelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "unparseable event, ignoring");
            return;
        }
    };

    match envelope.event.as_str() {
        EVENT_SPEECH_RECOGNIZED => match serde_json::from_value::<SpeechResult>(envelope.data) {
            Ok(result) => handler.on_speech_result(&result),
            Err(e) => warn!(error = %e, "malformed speechRecognized payload, ignoring"),
        },
        other => {
            debug!(event = other, "unrecognized event");
            handler.on_unknown_event(other);
        }
    }
}
