//! WebSocket session lifecycle: one connected client from upgrade through
//! disconnect.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ServerConfig;
use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL,
    WS_DISCONNECTIONS_TOTAL,
};
use crate::session::{MessageDispatcher, Session};

use super::connection::ClientConnection;
use super::handler::handle_frame;

/// How long cleanup waits for the writer to flush before aborting it.
const WRITER_GRACE: Duration = Duration::from_secs(5);

/// Close frame sent when a backend call fails.
fn backend_failure_frame() -> CloseFrame {
    CloseFrame {
        code: close_code::ERROR,
        reason: "backend unavailable".into(),
    }
}

/// Close frame sent when the server shuts down.
fn shutdown_frame() -> CloseFrame {
    CloseFrame {
        code: close_code::AWAY,
        reason: "server shutting down".into(),
    }
}

/// Run a WebSocket session for a connected client.
///
/// 1. Opens the session (creating a context unless resuming) and sends
///    `connection_opened`
/// 2. Handles incoming frames one at a time, in arrival order, while a
///    separate reader keeps consuming pongs
/// 3. Forwards outbound messages and sends periodic Ping frames
/// 4. Closes with 1011 on backend failure, 1001 on shutdown
/// 5. Unregisters the connection on disconnect
#[instrument(skip_all, fields(connection_id = %session.connection_id))]
pub async fn run_ws_session(
    ws: WebSocket,
    mut session: Session,
    dispatcher: Arc<MessageDispatcher>,
    config: ServerConfig,
    shutdown: CancellationToken,
) {
    let (ws_tx, ws_rx) = ws.split();

    let (send_tx, send_rx) = mpsc::channel::<String>(config.outbound_buffer.max(1));
    let connection = Arc::new(ClientConnection::new(session.connection_id.clone(), send_tx));
    let (close_tx, close_rx) = oneshot::channel::<CloseFrame>();
    let connection_token = shutdown.child_token();

    info!(
        session_id = %session.identity.session_id,
        application_id = %session.identity.application_id,
        "client connected"
    );
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    let mut writer = tokio::spawn(forward_outbound(
        ws_tx,
        send_rx,
        close_rx,
        Arc::clone(&connection),
        (config.ping_interval(), config.pong_timeout()),
        connection_token.clone(),
    ));

    // Socket reads run on their own task so pongs are seen while a turn
    // waits on a backend. Frames still reach the handler one at a time.
    let (frame_tx, mut frame_rx) = mpsc::channel::<String>(config.outbound_buffer.max(1));
    let reader = tokio::spawn(read_inbound(ws_rx, frame_tx, Arc::clone(&connection)));

    let close_frame = match dispatcher.open(&mut session, Arc::clone(&connection)).await {
        Ok(context_id) => {
            debug!(context_id = %context_id, "session opened");
            loop {
                let text = tokio::select! {
                    text = frame_rx.recv() => match text {
                        Some(text) => text,
                        None => break None,
                    },
                    () = connection_token.cancelled() => {
                        break shutdown.is_cancelled().then(shutdown_frame);
                    }
                };

                if let Err(err) = handle_frame(&text, &mut session, &connection, &dispatcher).await {
                    error!(
                        error = %err,
                        context_id = ?session.context_id(),
                        suggest_id = ?session.suggest_id,
                        "backend call failed, closing connection"
                    );
                    break Some(backend_failure_frame());
                }
            }
        }
        Err(err) => {
            error!(error = %err, "failed to open session");
            Some(backend_failure_frame())
        }
    };
    reader.abort();

    match close_frame {
        Some(frame) => {
            let _ = close_tx.send(frame);
        }
        None => drop(close_tx),
    }

    let _ = dispatcher.close(&connection.id).await;
    info!(dropped = connection.drop_count(), "client disconnected");
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(connection.age().as_secs_f64());

    if tokio::time::timeout(WRITER_GRACE, &mut writer).await.is_err() {
        warn!("outbound writer did not finish, aborting");
        writer.abort();
    }
}

/// Read frames off the socket until the client goes away.
///
/// Every frame counts as a liveness signal. Text and UTF-8 binary frames are
/// queued for the session loop in arrival order; the queue closing ends the
/// session.
async fn read_inbound(
    mut ws_rx: SplitStream<WebSocket>,
    frames: mpsc::Sender<String>,
    connection: Arc<ClientConnection>,
) {
    while let Some(frame) = ws_rx.next().await {
        connection.mark_alive();
        let text = match frame {
            Ok(Message::Text(text)) => text.to_string(),
            Ok(Message::Binary(data)) => {
                if let Ok(text) = std::str::from_utf8(&data) {
                    text.to_owned()
                } else {
                    debug!(len = data.len(), "ignoring non-UTF8 binary frame");
                    continue;
                }
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => {
                info!("client closed connection");
                return;
            }
            Err(e) => {
                debug!(error = %e, "websocket read failed");
                return;
            }
        };
        if frames.send(text).await.is_err() {
            return;
        }
    }
    info!("client closed connection");
}

/// Drain the outbound queue into the socket and keep the client alive with pings.
///
/// When the close signal fires, queued messages are flushed before the close
/// frame. Cancels `token` on exit so the read loop stops too.
async fn forward_outbound(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<String>,
    mut close_rx: oneshot::Receiver<CloseFrame>,
    connection: Arc<ClientConnection>,
    (ping_interval, pong_timeout): (Duration, Duration),
    token: CancellationToken,
) {
    let mut ping = tokio::time::interval(ping_interval);
    // Skip the immediate first tick
    let _ = ping.tick().await;

    loop {
        tokio::select! {
            msg = outbound_rx.recv() => {
                match msg {
                    Some(text) => {
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            frame = &mut close_rx => {
                while let Ok(text) = outbound_rx.try_recv() {
                    if ws_tx.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                if let Ok(frame) = frame {
                    let _ = ws_tx.send(Message::Close(Some(frame))).await;
                }
                break;
            }
            _ = ping.tick() => {
                if !connection.check_alive() && connection.last_pong_elapsed() > pong_timeout {
                    warn!(
                        connection_id = %connection.id,
                        "client unresponsive for {pong_timeout:?}, disconnecting"
                    );
                    break;
                }
                if ws_tx.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }
        }
    }

    debug!(
        connection_id = %connection.id,
        lifetime_ms = connection.age().as_millis(),
        "outbound writer finished"
    );
    token.cancel();
}
