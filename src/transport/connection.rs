//! WebSocket connection and event loop.
//!
//! This module owns the socket lifecycle for the channel to the playback
//! server: connecting, reconnecting on error or close, outbound framing of
//! requests and commands, and dispatch of inbound frames to either the
//! request registry (responses) or the event subscribers (pushes).
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that drives one socket at a time:
//!
//! - Incoming frames from the server (responses, events)
//! - Outgoing requests and commands from the client API
//! - Request/response correlation by id
//! - Reconnection with capped exponential backoff
//!
//! The socket is owned exclusively by that task and replaced wholesale on
//! reconnect, never mutated in place. Requests issued while no socket is
//! open queue in the actor channel and transmit after reopen; every request
//! still pending when a socket dies is rejected before the replacement
//! socket carries any frame.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, to_string};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{ClientMessage, Command, Event, ServerMessage};
use crate::schema;

use super::registry::RequestRegistry;

// ============================================================================
// Constants
// ============================================================================

/// First delay after a failed or broken connection.
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// Ceiling for the reconnect backoff.
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Buffered events per subscriber before a slow subscriber starts lagging.
const EVENT_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the channel.
///
/// A live connection is always exactly one of `Connecting`, `Open`, or
/// `Reconnecting`; `Closed` is only reached by an explicit local
/// [`Connection::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// First socket not yet established.
    Connecting,
    /// A socket is open and carrying frames.
    Open,
    /// The previous socket was lost; a replacement is being established.
    Reconnecting,
    /// Shut down locally; no further sockets will be opened.
    Closed,
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Frame and send a correlated request.
    Request {
        id: RequestId,
        path: String,
        data: Option<Value>,
    },
    /// Frame and send a fire-and-forget command.
    Command { command: Command },
    /// Close the socket and stop reconnecting.
    Shutdown,
}

/// Why a single socket session ended.
enum SessionEnd {
    /// Error or close on the socket; reconnect.
    Transport,
    /// Local shutdown; stop the loop.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// The bidirectional channel to the playback server.
///
/// Multiplexes any number of concurrent request/response exchanges over one
/// socket and fans pushed events out to subscribers. Reconnects on failure
/// without surfacing a different request API to callers.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync` and cheap to clone; all clones share one
/// socket and one correlation-id sequence.
pub struct Connection {
    /// Channel into the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// In-flight request tracking (shared with the event loop).
    registry: Arc<RequestRegistry>,
    /// Event fan-out (shared with the event loop).
    events: broadcast::Sender<Event>,
    /// Lifecycle observation.
    state_rx: watch::Receiver<ConnectionState>,
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            registry: Arc::clone(&self.registry),
            events: self.events.clone(),
            state_rx: self.state_rx.clone(),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Opens a connection to a `ws://` or `wss://` endpoint.
    ///
    /// Returns immediately after spawning the event loop; the first socket
    /// is established in the background and requests issued before it opens
    /// queue until it does. Use [`wait_until_open`](Self::wait_until_open)
    /// to observe the first successful open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `url` does not parse or is not a
    /// WebSocket URL.
    pub fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();
        let parsed = Url::parse(url).map_err(|_| Error::invalid_url(url))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(Error::invalid_url(url));
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let registry = Arc::new(RequestRegistry::new());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        tokio::spawn(Self::run_event_loop(
            parsed,
            command_rx,
            Arc::clone(&registry),
            events.clone(),
            state_tx,
        ));

        Ok(Self {
            command_tx,
            registry,
            events,
            state_rx,
        })
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Waits until a socket is open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the connection is shut down
    /// before a socket opens.
    pub async fn wait_until_open(&self) -> Result<()> {
        let mut state_rx = self.state_rx.clone();
        loop {
            match *state_rx.borrow_and_update() {
                ConnectionState::Open => return Ok(()),
                ConnectionState::Closed => return Err(Error::ConnectionClosed),
                ConnectionState::Connecting | ConnectionState::Reconnecting => {}
            }
            state_rx
                .changed()
                .await
                .map_err(|_| Error::ConnectionClosed)?;
        }
    }

    /// Sends a correlated request and waits for its raw response payload.
    ///
    /// A fresh correlation id is assigned at send time. The call suspends
    /// until the matching response arrives or the carrying socket is lost;
    /// there is no timeout at this layer.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the socket dies before the response
    ///   arrives, or the connection was shut down
    /// - [`Error::Json`] if the request payload cannot be framed
    pub async fn request(&self, path: impl Into<String>, data: Option<Value>) -> Result<Value> {
        let (id, response_rx) = self.registry.register();

        let queued = self.command_tx.send(ConnectionCommand::Request {
            id,
            path: path.into(),
            data,
        });
        if queued.is_err() {
            self.registry.reject(id, Error::ConnectionClosed);
            return Err(Error::ConnectionClosed);
        }

        match response_rx.await {
            Ok(result) => result,
            Err(_) => Err(Error::ConnectionClosed),
        }
    }

    /// Sends a fire-and-forget command.
    ///
    /// No correlation id is assigned and no response is expected. The
    /// command queues if no socket is currently open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the connection was shut down.
    pub fn send_command(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(ConnectionCommand::Command { command })
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Subscribes to pushed events.
    ///
    /// Any number of subscribers may exist; events are delivered to all of
    /// them and are independent of request/response traffic.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Returns the number of in-flight requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.registry.pending_count()
    }

    /// Shuts the connection down.
    ///
    /// Pending requests are rejected and no further socket is opened.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }
}

// ============================================================================
// Connection - Event Loop
// ============================================================================

impl Connection {
    /// Outer loop: establish a socket, drive it until it ends, reconnect.
    async fn run_event_loop(
        url: Url,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        registry: Arc<RequestRegistry>,
        events: broadcast::Sender<Event>,
        state_tx: watch::Sender<ConnectionState>,
    ) {
        let mut backoff = INITIAL_BACKOFF;

        loop {
            match connect_async(url.as_str()).await {
                Ok((ws_stream, _)) => {
                    debug!(url = %url, "WebSocket connection established");
                    backoff = INITIAL_BACKOFF;
                    let _ = state_tx.send(ConnectionState::Open);

                    let end =
                        Self::drive_session(ws_stream, &mut command_rx, &registry, &events).await;

                    match end {
                        SessionEnd::Shutdown => {
                            let _ = state_tx.send(ConnectionState::Closed);
                            // Stop accepting traffic, drain what already
                            // queued, then settle it all.
                            command_rx.close();
                            while command_rx.recv().await.is_some() {}
                            registry.reject_all();
                            debug!("Event loop terminated");
                            return;
                        }

                        SessionEnd::Transport => {
                            // Settle every pending request before the
                            // replacement socket carries any frame.
                            registry.reject_all();
                            let _ = state_tx.send(ConnectionState::Reconnecting);
                        }
                    }
                }

                Err(e) => {
                    warn!(error = %e, url = %url, "Connection attempt failed");
                    if command_rx.is_closed() {
                        // Every handle is gone; nobody is left to retry for.
                        registry.reject_all();
                        let _ = state_tx.send(ConnectionState::Closed);
                        return;
                    }
                }
            }

            sleep(backoff).await;
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    /// Drives one socket until it ends.
    async fn drive_session(
        ws_stream: WsStream,
        command_rx: &mut mpsc::UnboundedReceiver<ConnectionCommand>,
        registry: &RequestRegistry,
        events: &broadcast::Sender<Event>,
    ) -> SessionEnd {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming frames from the server
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::dispatch_frame(&text, registry, events);
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by server");
                            return SessionEnd::Transport;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            return SessionEnd::Transport;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            return SessionEnd::Transport;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Outbound traffic from the client API
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Request { id, path, data }) => {
                            if !Self::send_request(id, path, data, &mut ws_write, registry).await {
                                return SessionEnd::Transport;
                            }
                        }

                        Some(ConnectionCommand::Command { command }) => {
                            if !Self::send_fire_and_forget(command, &mut ws_write).await {
                                return SessionEnd::Transport;
                            }
                        }

                        Some(ConnectionCommand::Shutdown) | None => {
                            debug!("Shutting down connection");
                            let _ = ws_write.close().await;
                            return SessionEnd::Shutdown;
                        }
                    }
                }
            }
        }
    }

    /// Decodes one inbound frame and routes it.
    ///
    /// Responses go to the registry, events to the subscribers. A frame
    /// outside the wire vocabulary is logged and discarded; malformed input
    /// never takes the dispatch loop down.
    fn dispatch_frame(text: &str, registry: &RequestRegistry, events: &broadcast::Sender<Event>) {
        match schema::decode_str::<ServerMessage>(text) {
            Ok(ServerMessage::Response { id, response }) => {
                if registry.resolve(id, response) {
                    trace!(%id, "Response delivered");
                } else {
                    warn!(%id, "Response for unknown request");
                }
            }

            Ok(ServerMessage::Event { event }) => {
                trace!(?event, "Event received");
                // send() errs when no subscriber exists; events are droppable.
                let _ = events.send(event);
            }

            Err(e) => {
                warn!(error = %e, "Discarding unrecognized frame");
            }
        }
    }

    /// Frames and transmits a correlated request.
    ///
    /// Returns `false` if the socket must be considered dead.
    async fn send_request(
        id: RequestId,
        path: String,
        data: Option<Value>,
        ws_write: &mut WsSink,
        registry: &RequestRegistry,
    ) -> bool {
        // A request that queued across a reconnect was already rejected;
        // its id must never reach the replacement socket.
        if !registry.is_pending(id) {
            debug!(%id, "Dropping request settled while queued");
            return true;
        }

        let message = ClientMessage::Request { id, path, data };
        let json = match to_string(&message) {
            Ok(json) => json,
            Err(e) => {
                registry.reject(id, Error::Json(e));
                return true;
            }
        };

        if let Err(e) = ws_write.send(Message::Text(json.into())).await {
            warn!(error = %e, %id, "Failed to send request");
            return false;
        }

        trace!(%id, "Request sent");
        true
    }

    /// Frames and transmits a fire-and-forget command.
    ///
    /// Returns `false` if the socket must be considered dead.
    async fn send_fire_and_forget(command: Command, ws_write: &mut WsSink) -> bool {
        let message = ClientMessage::Command { command };
        let json = match to_string(&message) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Failed to frame command");
                return true;
            }
        };

        if let Err(e) = ws_write.send(Message::Text(json.into())).await {
            warn!(error = %e, "Failed to send command");
            return false;
        }

        trace!("Command sent");
        true
    }
}

// ============================================================================
// Tests
// ============================================================================
