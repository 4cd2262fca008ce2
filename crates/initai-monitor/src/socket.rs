//! Pusher WebSocket connection.
//!
//! Connects to the push service, keeps the requested channel subscriptions
//! alive for the lifetime of one connection and fans every received frame
//! out through a [`tokio::sync::broadcast`] channel. There is no reconnect:
//! once the socket drops the handle reports [`ConnectionState::Disconnected`].
//!
//! # Example
//!
//! ```rust,ignore
//! use initai_monitor::socket::{PusherSocket, SocketConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = SocketConfig::new(app_key);
//! let socket = PusherSocket::connect(&config, authorizer, CancellationToken::new())?;
//! let mut rx = socket.events();
//! socket.subscribe("presence-app_user-42");
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("{} on {:?}", event.event, event.channel);
//! }
//!
//! socket.disconnect();
//! ```

use std::sync::Arc;

use futures_util::{Sink, SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::authorizer::ChannelAuthorizer;
use crate::error::Error;
use crate::protocol::{self, ConnectionEstablished, PusherEvent};

// ── Broadcast channel capacity ───────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Public Pusher cluster host.
pub const DEFAULT_HOST: &str = "ws.pusherapp.com";

// ── SocketConfig ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SocketConfig {
    pub app_key: String,
    /// Host (and optional port) of the push service.
    pub host: String,
    /// `wss` when true, plain `ws` otherwise.
    pub encrypted: bool,
}

impl SocketConfig {
    pub fn new(app_key: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            host: DEFAULT_HOST.to_owned(),
            encrypted: true,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>, encrypted: bool) -> Self {
        self.host = host.into();
        self.encrypted = encrypted;
        self
    }

    pub fn url(&self) -> Result<Url, Error> {
        Ok(protocol::socket_url(&self.host, &self.app_key, self.encrypted)?)
    }
}

// ── ConnectionState ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected { socket_id: String },
    Disconnected,
    Failed(String),
}

impl ConnectionState {
    pub fn socket_id(&self) -> Option<&str> {
        match self {
            Self::Connected { socket_id } => Some(socket_id),
            _ => None,
        }
    }
}

enum SocketCommand {
    Subscribe(String),
    Unsubscribe(String),
}

// ── PusherSocket ─────────────────────────────────────────────────────

/// Handle to a running push-service connection.
///
/// Dropping the handle tears the connection down.
pub struct PusherSocket {
    commands: mpsc::UnboundedSender<SocketCommand>,
    events: broadcast::Sender<Arc<PusherEvent>>,
    state: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
}

impl PusherSocket {
    /// Spawn the connection task. Must be called inside a Tokio runtime.
    ///
    /// Returns as soon as the task is spawned; the handshake happens in the
    /// background. Channels requested before the handshake completes are
    /// subscribed once the socket id is known.
    pub fn connect<Z: ChannelAuthorizer>(
        config: &SocketConfig,
        authorizer: Arc<Z>,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        let url = config.url()?;
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let task = SocketTask {
            authorizer,
            events: event_tx.clone(),
            state: state_tx,
            channels: Vec::new(),
            socket_id: None,
        };
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            task.run(url, command_rx, task_cancel).await;
        });

        Ok(Self {
            commands: command_tx,
            events: event_tx,
            state: state_rx,
            cancel,
        })
    }

    /// A new receiver for every frame the socket receives.
    ///
    /// Frames sent before the receiver was created are not replayed.
    pub fn events(&self) -> broadcast::Receiver<Arc<PusherEvent>> {
        self.events.subscribe()
    }

    pub fn subscribe(&self, channel: &str) {
        self.send(SocketCommand::Subscribe(channel.to_owned()));
    }

    pub fn unsubscribe(&self, channel: &str) {
        self.send(SocketCommand::Unsubscribe(channel.to_owned()));
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// Watch connection state changes.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Close the connection. Commands already queued are flushed first.
    pub fn disconnect(&self) {
        self.cancel.cancel();
    }

    fn send(&self, command: SocketCommand) {
        if self.commands.send(command).is_err() {
            debug!("socket task has exited, command dropped");
        }
    }
}

impl Drop for PusherSocket {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Connection task ──────────────────────────────────────────────────

struct SocketTask<Z> {
    authorizer: Arc<Z>,
    events: broadcast::Sender<Arc<PusherEvent>>,
    state: watch::Sender<ConnectionState>,
    channels: Vec<String>,
    socket_id: Option<String>,
}

impl<Z: ChannelAuthorizer> SocketTask<Z> {
    async fn run(
        mut self,
        url: Url,
        mut commands: mpsc::UnboundedReceiver<SocketCommand>,
        cancel: CancellationToken,
    ) {
        info!(url = %url, "Connecting to push service");

        let connected = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = tokio_tungstenite::connect_async(url.as_str()) => Some(result),
        };
        let stream = match connected {
            None => {
                self.state.send_replace(ConnectionState::Disconnected);
                return;
            }
            Some(Err(e)) => {
                warn!(error = %e, "Push service connection failed");
                self.state.send_replace(ConnectionState::Failed(e.to_string()));
                return;
            }
            Some(Ok((stream, _response))) => stream,
        };

        let (mut write, mut read) = stream.split();

        let final_state = loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    while let Ok(command) = commands.try_recv() {
                        self.apply(command, &mut write).await;
                    }
                    if let Err(e) = write.send(Message::Close(None)).await {
                        debug!(error = %e, "Close frame not delivered");
                    }
                    break ConnectionState::Disconnected;
                }
                command = commands.recv() => {
                    match command {
                        Some(command) => self.apply(command, &mut write).await,
                        None => break ConnectionState::Disconnected,
                    }
                }
                frame = read.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_text(text.as_str(), &mut write).await;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            if let Some(cf) = frame {
                                info!(
                                    code = %cf.code,
                                    reason = %cf.reason,
                                    "Push service closed the connection"
                                );
                            } else {
                                info!("Push service closed the connection");
                            }
                            break ConnectionState::Disconnected;
                        }
                        Some(Ok(Message::Ping(_))) => trace!("WebSocket ping"),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "Push service connection broke");
                            break ConnectionState::Failed(e.to_string());
                        }
                        None => {
                            info!("Push service stream ended");
                            break ConnectionState::Disconnected;
                        }
                    }
                }
            }
        };

        self.state.send_replace(final_state);
        debug!("Push service task exiting");
    }

    async fn apply<W>(&mut self, command: SocketCommand, write: &mut W)
    where
        W: Sink<Message, Error = tungstenite::Error> + Unpin,
    {
        match command {
            SocketCommand::Subscribe(channel) => {
                if self.channels.contains(&channel) {
                    return;
                }
                self.channels.push(channel.clone());
                if let Some(socket_id) = self.socket_id.clone() {
                    self.subscribe_channel(&socket_id, &channel, write).await;
                }
            }
            SocketCommand::Unsubscribe(channel) => {
                self.channels.retain(|c| *c != channel);
                if self.socket_id.is_some() {
                    send_text(write, protocol::unsubscribe_frame(&channel)).await;
                }
            }
        }
    }

    async fn handle_text<W>(&mut self, text: &str, write: &mut W)
    where
        W: Sink<Message, Error = tungstenite::Error> + Unpin,
    {
        let Some(event) = protocol::parse_frame(text) else {
            return;
        };

        match event.event.as_str() {
            protocol::CONNECTION_ESTABLISHED => {
                match serde_json::from_value::<ConnectionEstablished>(event.payload()) {
                    Ok(established) => {
                        info!(socket_id = %established.socket_id, "Push service connected");
                        self.socket_id = Some(established.socket_id.clone());
                        self.state.send_replace(ConnectionState::Connected {
                            socket_id: established.socket_id.clone(),
                        });
                        for channel in self.channels.clone() {
                            self.subscribe_channel(&established.socket_id, &channel, write)
                                .await;
                        }
                    }
                    Err(e) => warn!(error = %e, "Malformed connection_established payload"),
                }
            }
            protocol::PING => send_text(write, protocol::pong_frame()).await,
            protocol::ERROR => warn!(payload = %event.payload(), "Push service error"),
            protocol::SUBSCRIPTION_SUCCEEDED => {
                info!(channel = event.channel.as_deref().unwrap_or_default(), "Subscribed");
            }
            _ => trace!(event = %event.event, "Push event"),
        }

        self.broadcast(event);
    }

    async fn subscribe_channel<W>(&self, socket_id: &str, channel: &str, write: &mut W)
    where
        W: Sink<Message, Error = tungstenite::Error> + Unpin,
    {
        if !protocol::requires_auth(channel) {
            send_text(write, protocol::subscribe_frame(channel, None)).await;
            return;
        }

        match self.authorizer.authorize(socket_id, channel).await {
            Ok(auth) => send_text(write, protocol::subscribe_frame(channel, Some(&auth))).await,
            Err(e) => {
                warn!(channel, error = %e, "Channel authorization failed");
                self.broadcast(subscription_error(channel, &e));
            }
        }
    }

    fn broadcast(&self, event: PusherEvent) {
        // No receivers is fine; nobody is listening yet.
        let _ = self.events.send(Arc::new(event));
    }
}

/// The event delivered on a channel whose authorization was refused.
fn subscription_error(channel: &str, error: &Error) -> PusherEvent {
    let data = match error {
        Error::ChannelAuthorization {
            status,
            status_text,
            message,
        } => json!({
            "type": "AuthError",
            "status": status,
            "statusText": status_text,
            "message": message,
        }),
        other => json!({
            "type": "AuthError",
            "status": 0,
            "message": other.to_string(),
        }),
    };
    PusherEvent::new(protocol::SUBSCRIPTION_ERROR, Some(channel), data)
}

async fn send_text<W>(write: &mut W, frame: String)
where
    W: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    trace!(frame = %frame, "Sending frame");
    if let Err(e) = write.send(Message::text(frame)).await {
        warn!(error = %e, "Failed to send frame");
    }
}
