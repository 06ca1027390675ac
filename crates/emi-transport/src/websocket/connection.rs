//! WebSocket event stream connection.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, header::AUTHORIZATION};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use emi_core::{EventSource, RawEvent, StreamConnectionConfig, TransportError, TransportResult};

use super::codec::decode_frame;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Capacity of the outbound event channel. A slow consumer blocks the
/// receive task instead of buffering.
const EVENT_CHANNEL_CAPACITY: usize = 1;

/// The live half of an open connection.
struct Active {
    generation: u64,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

/// An `open` that is still connecting.
struct Pending {
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct State {
    current: Option<Active>,
    pending: Option<Pending>,
    generation: u64,
    /// Completion signal of the most recent connection, kept after it ends.
    done: Option<CancellationToken>,
}

/// A single persistent WebSocket connection to the gateway event endpoint.
///
/// `open` spawns a receive task that decodes every inbound frame into a
/// [`RawEvent`] and pushes it onto a channel of capacity one. The connection
/// ends on `close`, on a gateway close or read failure, and when the event
/// receiver is dropped. It is never re-established automatically; the
/// runtime supervisor does that.
///
/// Connecting is bounded by the configured connect timeout and does not hold
/// the state lock, so `close` also abandons an `open` that is still
/// connecting.
pub struct StreamConnection {
    config: StreamConnectionConfig,
    state: Arc<RwLock<State>>,
}

impl StreamConnection {
    /// Creates a closed connection.
    pub fn new(config: StreamConnectionConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(State::default())),
        }
    }

    /// Returns the configured endpoint URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Returns true while a connection is open.
    pub async fn is_connected(&self) -> bool {
        self.state.read().await.current.is_some()
    }

    fn build_request(
        &self,
    ) -> TransportResult<tokio_tungstenite::tungstenite::handshake::client::Request> {
        let mut request = self.config.url.as_str().into_client_request().map_err(|e| {
            TransportError::ConnectionFailed {
                url: self.config.url.clone(),
                reason: e.to_string(),
            }
        })?;

        if let Some(token) = &self.config.access_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| TransportError::InvalidConfig(format!("invalid access token: {e}")))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        Ok(request)
    }
}

#[async_trait]
impl EventSource for StreamConnection {
    async fn open(&self) -> TransportResult<mpsc::Receiver<RawEvent>> {
        let (request, generation, cancel) = {
            let mut state = self.state.write().await;
            let connecting = state
                .pending
                .as_ref()
                .is_some_and(|p| !p.cancel.is_cancelled());
            if state.current.is_some() || connecting {
                return Err(TransportError::AlreadyConnected);
            }
            let request = self.build_request()?;
            state.generation += 1;
            let cancel = CancellationToken::new();
            state.pending = Some(Pending {
                generation: state.generation,
                cancel: cancel.clone(),
            });
            (request, state.generation, cancel)
        };
        // Abandons the reservation if this future is dropped mid-connect.
        let _reservation = cancel.clone().drop_guard();

        info!(url = %self.config.url, generation, "Connecting to event stream");
        let connect = tokio::time::timeout(self.config.connect_timeout, connect_async(request));
        let connected = tokio::select! {
            _ = cancel.cancelled() => None,
            connected = connect => Some(connected),
        };

        let mut state = self.state.write().await;
        if state.pending.as_ref().is_some_and(|p| p.generation == generation) {
            state.pending = None;
        }

        let ws = match connected {
            None => {
                return Err(TransportError::ConnectionClosed {
                    reason: "closed while connecting".into(),
                });
            }
            Some(Err(_)) => {
                return Err(TransportError::ConnectionFailed {
                    url: self.config.url.clone(),
                    reason: format!(
                        "handshake timed out after {:?}",
                        self.config.connect_timeout
                    ),
                });
            }
            Some(Ok(Err(e))) => {
                return Err(TransportError::ConnectionFailed {
                    url: self.config.url.clone(),
                    reason: e.to_string(),
                });
            }
            Some(Ok(Ok((ws, _response)))) => ws,
        };
        if cancel.is_cancelled() {
            return Err(TransportError::ConnectionClosed {
                reason: "closed while connecting".into(),
            });
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let shutdown = CancellationToken::new();
        let done = CancellationToken::new();

        let task = tokio::spawn(run_receive_task(ReceiveTask {
            ws,
            tx,
            shutdown: shutdown.clone(),
            done: done.clone(),
            state: Arc::clone(&self.state),
            generation,
        }));

        state.current = Some(Active {
            generation,
            shutdown,
            task,
        });
        state.done = Some(done);

        info!(url = %self.config.url, generation, "Event stream connected");
        Ok(rx)
    }

    async fn close(&self) -> TransportResult<()> {
        let (active, pending) = {
            let mut state = self.state.write().await;
            (state.current.take(), state.pending.take())
        };

        if let Some(pending) = pending {
            debug!(generation = pending.generation, "Abandoning pending connect");
            pending.cancel.cancel();
        }

        let Some(active) = active else {
            return Ok(());
        };

        info!(generation = active.generation, "Closing event stream");
        active.shutdown.cancel();
        if let Err(e) = active.task.await {
            warn!(error = %e, "Receive task did not finish cleanly");
        }
        Ok(())
    }

    async fn wait(&self) {
        let done = self.state.read().await.done.clone();
        if let Some(done) = done {
            done.cancelled().await;
        }
    }
}

struct ReceiveTask {
    ws: WsStream,
    tx: mpsc::Sender<RawEvent>,
    shutdown: CancellationToken,
    done: CancellationToken,
    state: Arc<RwLock<State>>,
    generation: u64,
}

/// Runs one connection's receive loop, then closes its channel and fires
/// its completion signal.
async fn run_receive_task(task: ReceiveTask) {
    let ReceiveTask {
        ws,
        tx,
        shutdown,
        done,
        state,
        generation,
    } = task;

    receive_loop(ws, &tx, &shutdown, &state, generation).await;

    drop(tx);
    done.cancel();
    debug!(generation, "Receive task finished");
}

async fn receive_loop(
    ws: WsStream,
    tx: &mpsc::Sender<RawEvent>,
    shutdown: &CancellationToken,
    state: &RwLock<State>,
    generation: u64,
) {
    let (mut sink, mut stream) = ws.split();

    loop {
        let message = tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = sink.close().await;
                return;
            }
            _ = tx.closed() => {
                consumer_gone(state, generation).await;
                let _ = sink.close().await;
                return;
            }
            message = stream.next() => message,
        };

        match message {
            Some(Ok(Message::Ping(data))) => {
                trace!(generation, "Received ping, sending pong");
                if let Err(e) = sink.send(Message::Pong(data)).await {
                    warn!(generation, error = %e, "Failed to send pong");
                }
            }
            Some(Ok(Message::Pong(_))) => {
                trace!(generation, "Received pong");
            }
            Some(Ok(Message::Close(frame))) => {
                if release_if_current(state, generation).await {
                    info!(generation, frame = ?frame, "Gateway closed event stream");
                }
                return;
            }
            Some(Ok(message)) => match decode_frame(&message) {
                Ok(event) => {
                    debug!(generation, event_type = %event.event_type, "Received event");
                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            let _ = sink.close().await;
                            return;
                        }
                        sent = tx.send(event) => {
                            if sent.is_err() {
                                consumer_gone(state, generation).await;
                                let _ = sink.close().await;
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!(generation, error = %e, "Failed to decode frame, dropping it");
                }
            },
            Some(Err(e)) => {
                if release_if_current(state, generation).await {
                    error!(generation, error = %e, "Event stream read failed");
                } else {
                    trace!(generation, "Read failed on a superseded connection");
                }
                return;
            }
            None => {
                if release_if_current(state, generation).await {
                    info!(generation, "Event stream ended");
                }
                return;
            }
        }
    }
}

/// Ends a connection whose event receiver has been dropped.
async fn consumer_gone(state: &RwLock<State>, generation: u64) {
    if release_if_current(state, generation).await {
        warn!(generation, "Event receiver dropped, closing event stream");
    }
}

/// Clears the current connection if it is still `generation`.
///
/// Returns false when the connection was already closed or replaced, in
/// which case the caller exits without reporting anything.
async fn release_if_current(state: &RwLock<State>, generation: u64) -> bool {
    let mut state = state.write().await;
    match &state.current {
        Some(active) if active.generation == generation => {
            // The task handle is dropped, not awaited: this runs on that task.
            state.current = None;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use tokio::net::TcpListener;
    use tokio::time::timeout;
    use tokio_tungstenite::accept_hdr_async;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    use super::*;

    const PAYLOAD: &str = r#"{"type":"message_receive","self_id":1,"time":1000,"data":{"text":"hi"}}"#;

    struct Gateway {
        url: String,
        auth: Arc<Mutex<Option<String>>>,
    }

    /// Serves every connection: waits `delay`, sends `frames`, optionally
    /// closes, then drains until the client goes away.
    async fn spawn_gateway(frames: Vec<Message>, delay: Duration, close_after: bool) -> Gateway {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let auth = Arc::new(Mutex::new(None));
        let seen = Arc::clone(&auth);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let seen = Arc::clone(&seen);
                let frames = frames.clone();
                tokio::spawn(async move {
                    let callback =
                        move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                            *seen.lock().unwrap() = req
                                .headers()
                                .get(AUTHORIZATION)
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string);
                            Ok(resp)
                        };
                    let mut ws = accept_hdr_async(stream, callback).await.unwrap();
                    tokio::time::sleep(delay).await;
                    for frame in frames {
                        if ws.send(frame).await.is_err() {
                            return;
                        }
                    }
                    if close_after {
                        let _ = ws.close(None).await;
                    }
                    while let Some(Ok(_)) = ws.next().await {}
                });
            }
        });

        Gateway {
            url: format!("ws://{addr}"),
            auth,
        }
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    async fn recv(rx: &mut mpsc::Receiver<RawEvent>) -> Option<RawEvent> {
        timeout(Duration::from_secs(5), rx.recv()).await.unwrap()
    }

    #[tokio::test]
    async fn test_receives_text_and_binary_frames() {
        let gateway = spawn_gateway(
            vec![Message::text(PAYLOAD), Message::binary(zlib(PAYLOAD.as_bytes()))],
            Duration::ZERO,
            false,
        )
        .await;
        let conn = StreamConnection::new(StreamConnectionConfig::new(&gateway.url));

        let mut rx = conn.open().await.unwrap();
        let first = recv(&mut rx).await.unwrap();
        let second = recv(&mut rx).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.event_type, "message_receive");
        assert_eq!(first.self_id, 1);

        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_frame_is_skipped() {
        let gateway = spawn_gateway(
            vec![Message::text("garbage"), Message::text(PAYLOAD)],
            Duration::ZERO,
            false,
        )
        .await;
        let conn = StreamConnection::new(StreamConnectionConfig::new(&gateway.url));

        let mut rx = conn.open().await.unwrap();
        let event = recv(&mut rx).await.unwrap();
        assert_eq!(event.event_type, "message_receive");
        assert!(conn.is_connected().await);

        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_twice_fails_without_disturbing_stream() {
        let gateway =
            spawn_gateway(vec![Message::text(PAYLOAD)], Duration::from_millis(100), false).await;
        let conn = StreamConnection::new(StreamConnectionConfig::new(&gateway.url));

        let mut rx = conn.open().await.unwrap();
        let err = conn.open().await.unwrap_err();
        assert!(matches!(err, TransportError::AlreadyConnected));

        let event = recv(&mut rx).await.unwrap();
        assert_eq!(event.event_type, "message_receive");

        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_releases_waiters() {
        let gateway = spawn_gateway(Vec::new(), Duration::ZERO, false).await;
        let conn = StreamConnection::new(StreamConnectionConfig::new(&gateway.url));

        conn.close().await.unwrap();

        let mut rx = conn.open().await.unwrap();
        conn.close().await.unwrap();
        conn.close().await.unwrap();

        assert!(recv(&mut rx).await.is_none());
        timeout(Duration::from_secs(1), conn.wait()).await.unwrap();
        assert!(!conn.is_connected().await);
    }

    #[tokio::test]
    async fn test_wait_without_open_returns() {
        let conn = StreamConnection::new(StreamConnectionConfig::new("ws://127.0.0.1:1"));
        timeout(Duration::from_secs(1), conn.wait()).await.unwrap();
    }

    #[tokio::test]
    async fn test_gateway_close_ends_stream_and_allows_reopen() {
        let gateway = spawn_gateway(vec![Message::text(PAYLOAD)], Duration::ZERO, true).await;
        let conn = StreamConnection::new(StreamConnectionConfig::new(&gateway.url));

        let mut rx = conn.open().await.unwrap();
        assert!(recv(&mut rx).await.is_some());
        assert!(recv(&mut rx).await.is_none());

        timeout(Duration::from_secs(1), conn.wait()).await.unwrap();
        assert!(!conn.is_connected().await);

        let mut rx = conn.open().await.unwrap();
        assert!(recv(&mut rx).await.is_some());
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        let gateway = spawn_gateway(vec![Message::text(PAYLOAD)], Duration::ZERO, false).await;
        let conn = StreamConnection::new(
            StreamConnectionConfig::new(&gateway.url).with_access_token("secret"),
        );

        let mut rx = conn.open().await.unwrap();
        recv(&mut rx).await.unwrap();

        assert_eq!(gateway.auth.lock().unwrap().as_deref(), Some("Bearer secret"));
        conn.close().await.unwrap();
    }

    /// Accepts TCP connections and never answers the upgrade request.
    async fn spawn_silent_listener() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        format!("ws://{addr}")
    }

    #[tokio::test]
    async fn test_close_abandons_hanging_handshake() {
        let url = spawn_silent_listener().await;
        let conn = Arc::new(StreamConnection::new(
            StreamConnectionConfig::new(url).with_connect_timeout(Duration::from_secs(60)),
        ));

        let opening = tokio::spawn({
            let conn = Arc::clone(&conn);
            async move { conn.open().await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let err = conn.open().await.unwrap_err();
        assert!(matches!(err, TransportError::AlreadyConnected));
        assert!(!conn.is_connected().await);

        timeout(Duration::from_secs(2), conn.close()).await.unwrap().unwrap();
        timeout(Duration::from_secs(2), conn.wait()).await.unwrap();

        let err = timeout(Duration::from_secs(2), opening)
            .await
            .unwrap()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed { .. }));
        assert!(!conn.is_connected().await);
    }

    #[tokio::test]
    async fn test_handshake_timeout() {
        let url = spawn_silent_listener().await;
        let conn = StreamConnection::new(
            StreamConnectionConfig::new(url).with_connect_timeout(Duration::from_millis(200)),
        );

        let err = timeout(Duration::from_secs(5), conn.open())
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed { .. }));

        // The timed-out attempt no longer counts as connecting.
        let err = timeout(Duration::from_secs(5), conn.open())
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed { .. }));
    }

    #[tokio::test]
    async fn test_dropped_receiver_releases_connection() {
        let gateway = spawn_gateway(Vec::new(), Duration::ZERO, false).await;
        let conn = StreamConnection::new(StreamConnectionConfig::new(&gateway.url));

        let rx = conn.open().await.unwrap();
        assert!(conn.is_connected().await);
        drop(rx);

        timeout(Duration::from_secs(2), conn.wait()).await.unwrap();
        assert!(!conn.is_connected().await);

        let mut rx = conn.open().await.unwrap();
        conn.close().await.unwrap();
        assert!(recv(&mut rx).await.is_none());
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let conn = StreamConnection::new(StreamConnectionConfig::new(format!("ws://{addr}")));
        let err = conn.open().await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed { .. }));
        assert!(!conn.is_connected().await);
    }
}
