//! Relay listener bootstrap.
//!
//! Binds the first available candidate port and serves the relay path as a
//! WebSocket endpoint. Each accepted socket is greeted, attached to the
//! [`ConnectionHub`] and fed from a bounded outbound queue.

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{
        ConnectInfo, OriginalUri, State, WebSocketUpgrade,
        ws::{Message, Utf8Bytes, WebSocket},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use protocol::{Envelope, ServerCodec, Welcome, error::DecodeError};
use tokio::{
    net::TcpListener,
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    config::RelayConfig,
    error::{BootstrapError, SendError},
    hub::{ConnectionHub, ControlOutcome, Viewer, ViewerId},
};

/// Route serving the Prometheus text exposition.
pub const METRICS_PATH: &str = "/metrics";

/// What is known about a connection when it is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Handshake {
    /// Request target, including any query string.
    pub path: Option<String>,
    pub remote_address: Option<String>,
}

impl Handshake {
    /// The greeting for this connection, or `None` if the path or remote
    /// address is missing.
    pub fn welcome(&self, message: &str) -> Option<Envelope> {
        let path = self.path.as_deref().filter(|path| !path.is_empty())?;
        let remote = self.remote_address.as_deref().filter(|remote| !remote.is_empty())?;
        Some(Envelope::welcome(path, Welcome::new(message, path, remote)))
    }
}

/// A running relay listener.
pub struct RelayListener {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl RelayListener {
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Closes every viewer socket and waits for the server to stop.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(error) = self.task.await {
            warn!(%error, "relay listener task ended abnormally");
        }
        info!(local_addr = %self.local_addr, "relay listener stopped");
    }
}

/// Tries `bind` on each port in order and returns the first success.
///
/// Failures are logged and the next port is tried. If every port fails the
/// error lists all of them.
pub async fn bind_first<T, E, F, Fut>(ports: &[u16], mut bind: F) -> Result<T, BootstrapError>
where
    F: FnMut(u16) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    for &port in ports {
        match bind(port).await {
            Ok(bound) => {
                info!(port, "relay listener bound");
                return Ok(bound);
            }
            Err(error) => warn!(port, %error, "failed to bind relay listener, retrying"),
        }
    }
    Err(BootstrapError::Exhausted { ports: ports.to_vec() })
}

/// Binds the first free port in `config.ports` and starts serving.
pub async fn start_with_retry(
    config: &RelayConfig,
    hub: Arc<ConnectionHub>,
) -> Result<RelayListener, BootstrapError> {
    if !config.path.starts_with('/') {
        return Err(BootstrapError::InvalidPath(config.path.clone()));
    }

    let host = config.host;
    let listener =
        bind_first(&config.ports, |port| TcpListener::bind(SocketAddr::new(host, port))).await?;
    let local_addr = listener.local_addr().map_err(BootstrapError::LocalAddr)?;

    let shutdown = CancellationToken::new();
    let state = RelayState {
        hub,
        welcome_message: Arc::from(config.welcome_message.as_str()),
        queue_capacity: config.queue_capacity.max(1),
        shutdown: shutdown.clone(),
    };
    let app = Router::new()
        .route(&config.path, get(upgrade))
        .route(METRICS_PATH, get(metrics))
        .with_state(state);

    let token = shutdown.clone();
    let task = tokio::spawn(async move {
        let service = app.into_make_service_with_connect_info::<SocketAddr>();
        if let Err(error) =
            axum::serve(listener, service).with_graceful_shutdown(token.cancelled_owned()).await
        {
            error!(%error, "relay listener failed");
        }
    });

    info!(%local_addr, path = %config.path, "relay listener started");
    Ok(RelayListener { local_addr, shutdown, task })
}

#[derive(Clone)]
struct RelayState {
    hub: Arc<ConnectionHub>,
    welcome_message: Arc<str>,
    queue_capacity: usize,
    shutdown: CancellationToken,
}

async fn upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    OriginalUri(uri): OriginalUri,
    State(state): State<RelayState>,
) -> Response {
    let handshake = Handshake {
        path: uri.path_and_query().map(|target| target.as_str().to_owned()),
        remote_address: Some(remote.ip().to_string()),
    };
    debug!(%remote, "viewer connecting");
    ws.on_upgrade(move |socket| serve_socket(socket, handshake, state))
}

async fn metrics(State(state): State<RelayState>) -> Response {
    match state.hub.metrics().gather() {
        Ok(body) => ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response(),
        Err(error) => {
            warn!(%error, "failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Hub-facing half of a socket: frames go into the bounded outbound queue.
struct QueueViewer {
    tx: mpsc::Sender<Message>,
}

impl Viewer for QueueViewer {
    fn send(&self, frame: &Utf8Bytes) -> Result<(), SendError> {
        self.tx.try_send(Message::Text(frame.clone())).map_err(|error| match error {
            TrySendError::Full(_) => SendError::QueueFull,
            TrySendError::Closed(_) => SendError::Closed,
        })
    }
}

/// Queues the greeting, if any, then attaches the socket's queue to the hub.
///
/// A connection without a greeting is still attached.
fn admit(
    handshake: &Handshake,
    welcome_message: &str,
    hub: &ConnectionHub,
    tx: &mpsc::Sender<Message>,
) -> ViewerId {
    // Queued before attach so it precedes any log frame.
    if let Some(welcome) = handshake.welcome(welcome_message) {
        match ServerCodec.encode(&welcome) {
            Ok(text) => {
                if tx.try_send(Message::Text(text.into())).is_err() {
                    debug!("viewer closed before greeting");
                }
            }
            Err(error) => warn!(%error, "failed to serialize welcome"),
        }
    }

    hub.attach(Arc::new(QueueViewer { tx: tx.clone() }))
}

async fn serve_socket(socket: WebSocket, handshake: Handshake, state: RelayState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(state.queue_capacity);

    let id = admit(&handshake, &state.welcome_message, &state.hub, &tx);

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(error) = sender.send(message).await {
                debug!(%error, "failed to write to viewer socket");
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => {
                let _ = tx.try_send(Message::Close(None));
                break;
            }
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    report_control(id, state.hub.handle_message(text.as_str()));
                }
                Some(Ok(Message::Binary(bytes))) => {
                    report_control(id, state.hub.handle_bytes(&bytes));
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    debug!(viewer = %id, %error, "viewer socket error");
                    break;
                }
            },
        }
    }

    state.hub.detach(id);
    drop(tx);
    if let Err(error) = send_task.await {
        warn!(viewer = %id, %error, "viewer send task ended abnormally");
    }
    debug!(viewer = %id, "viewer disconnected");
}

fn report_control(id: ViewerId, result: Result<ControlOutcome, DecodeError>) {
    match result {
        Ok(ControlOutcome::Applied { root_updates }) => {
            debug!(viewer = %id, root_updates, "control frame applied");
        }
        Ok(ControlOutcome::Ignored) => debug!(viewer = %id, "control frame ignored"),
        Err(error) => warn!(viewer = %id, %error, "malformed control frame"),
    }
}
