// ── Monitor client ──
//
// Subscribes to a user's presence channel and republishes fresh suggestion
// sets on a local event bus.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use initai_api::{ApiProfile, ConversationApi, SuggestionsResult, Validation};

use crate::authorizer::ApiChannelAuthorizer;
use crate::bus::{EventBus, Handler};
use crate::error::Error;
use crate::protocol::{self, PusherEvent};
use crate::socket::{ConnectionState, PusherSocket, SocketConfig};
use crate::validate::{MonitorConfig, validate_monitor_config};

/// Bus (and push) event announcing a new suggestion set.
pub const NEW_SUGGESTIONS_EVENT: &str = "suggestions:new";

/// Presence channel carrying a user's conversation notifications.
pub fn channel_name(user_id: &str) -> String {
    format!("presence-app_user-{user_id}")
}

/// Observable lifecycle of a live [`MonitorClient`], derived from the
/// socket and the channel subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MonitorState {
    /// Handshake or channel authorization still in flight.
    Subscribing,
    /// The push service confirmed the channel subscription.
    Active,
    /// Channel authorization was refused; no notifications will arrive.
    Rejected,
    /// The socket closed or never connected.
    Disconnected,
}

/// Realtime suggestion monitor for one end user.
///
/// Bus handlers receive the [`SuggestionsResult`] fetched after each
/// `suggestions:new` notification.
pub struct MonitorClient<A: ConversationApi> {
    user_id: String,
    channel: String,
    api: Arc<A>,
    socket: PusherSocket,
    bus: Arc<EventBus<SuggestionsResult>>,
    subscription: watch::Receiver<MonitorState>,
    bindings: CancellationToken,
}

impl<A: ConversationApi> MonitorClient<A> {
    /// Validate `config`, connect to the push service and subscribe to the
    /// user's channel.
    ///
    /// The handshake and channel authorization continue in the background;
    /// authorization failures are logged, never returned here.
    #[allow(clippy::unused_async)]
    pub async fn create(config: MonitorConfig<A>) -> Result<Self, Error> {
        if let Validation::Invalid { message } = validate_monitor_config(Some(&config)) {
            return Err(Error::Configuration { message });
        }

        let MonitorConfig {
            api_client,
            user_id,
            pusher_app_key,
            pusher_host,
            encrypted,
        } = config;
        let api = api_client.ok_or_else(|| Error::Configuration {
            message: "A valid `apiClient` is required.".into(),
        })?;

        let socket_config = socket_config(pusher_app_key, pusher_host, encrypted);
        let authorizer = Arc::new(ApiChannelAuthorizer::new(Arc::clone(&api), &user_id)?);
        let socket = PusherSocket::connect(&socket_config, authorizer, CancellationToken::new())?;

        let channel = channel_name(&user_id);
        let bus = Arc::new(EventBus::new());
        let bindings = CancellationToken::new();
        let (subscription_tx, subscription) = watch::channel(MonitorState::Subscribing);

        debug!(channel = %channel, "Subscribing");
        // Receiver first so nothing published after the subscribe is missed.
        let events = socket.events();
        socket.subscribe(&channel);

        tokio::spawn(bind_channel(
            events,
            channel.clone(),
            Arc::clone(&api),
            user_id.clone(),
            Arc::clone(&bus),
            subscription_tx,
            bindings.clone(),
        ));

        info!(user_id = %user_id, channel = %channel, "Monitor created");
        Ok(Self {
            user_id,
            channel,
            api,
            socket,
            bus,
            subscription,
            bindings,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn channel_name(&self) -> &str {
        &self.channel
    }

    /// The shared API collaborator this monitor was created with.
    pub fn api_client(&self) -> &Arc<A> {
        &self.api
    }

    pub fn state(&self) -> MonitorState {
        match self.socket.state() {
            ConnectionState::Disconnected | ConnectionState::Failed(_) => {
                MonitorState::Disconnected
            }
            ConnectionState::Connecting => MonitorState::Subscribing,
            ConnectionState::Connected { .. } => *self.subscription.borrow(),
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.socket.state()
    }

    /// Register `handler` for `event_name`.
    pub fn on(&self, event_name: &str, handler: Handler<SuggestionsResult>) -> Result<(), Error> {
        self.bus.on(event_name, handler)
    }

    /// Register a closure and hand back the handler for a later [`off`](Self::off).
    pub fn on_fn<F>(&self, event_name: &str, f: F) -> Result<Handler<SuggestionsResult>, Error>
    where
        F: Fn(&SuggestionsResult) + Send + Sync + 'static,
    {
        let handler: Handler<SuggestionsResult> = Arc::new(f);
        self.bus.on(event_name, Arc::clone(&handler))?;
        Ok(handler)
    }

    /// Remove handlers; see [`EventBus::off`].
    pub fn off(&self, event_name: Option<&str>, handler: Option<&Handler<SuggestionsResult>>) {
        self.bus.off(event_name, handler);
    }

    /// Unsubscribe from the channel, close the socket and drop every handler.
    ///
    /// The API collaborator is left untouched.
    pub fn destroy(self) {
        self.bindings.cancel();
        self.socket.unsubscribe(&self.channel);
        self.socket.disconnect();
        self.bus.clear();
        info!(user_id = %self.user_id, "Monitor destroyed");
    }
}

impl<A: ConversationApi> Drop for MonitorClient<A> {
    fn drop(&mut self) {
        self.bindings.cancel();
    }
}

/// Empty app keys fall back to the default profile's key.
fn socket_config(app_key: Option<String>, host: Option<String>, encrypted: bool) -> SocketConfig {
    let app_key = app_key
        .filter(|key| !key.is_empty())
        .unwrap_or_else(|| ApiProfile::default().pusher_app_key().to_owned());
    let config = SocketConfig::new(app_key);
    match host {
        Some(host) => config.with_host(host, encrypted),
        None => config,
    }
}

// ── Channel bindings ─────────────────────────────────────────────────

async fn bind_channel<A: ConversationApi>(
    mut events: broadcast::Receiver<Arc<PusherEvent>>,
    channel: String,
    api: Arc<A>,
    user_id: String,
    bus: Arc<EventBus<SuggestionsResult>>,
    subscription: watch::Sender<MonitorState>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = events.recv() => match received {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Monitor fell behind the push stream");
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
        };

        if !event.is_on(&channel) {
            continue;
        }

        match event.event.as_str() {
            protocol::SUBSCRIPTION_ERROR => {
                let payload = event.payload();
                let message = payload
                    .get("message")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("Channel subscription failed");
                error!("{message}");
                subscription.send_replace(MonitorState::Rejected);
            }
            protocol::SUBSCRIPTION_SUCCEEDED => {
                subscription.send_replace(MonitorState::Active);
            }
            NEW_SUGGESTIONS_EVENT => {
                let api = Arc::clone(&api);
                let bus = Arc::clone(&bus);
                let user_id = user_id.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {}
                        () = refresh_suggestions(api.as_ref(), &user_id, &bus) => {}
                    }
                });
            }
            _ => {}
        }
    }
    debug!(channel = %channel, "Channel bindings released");
}

/// Fetch the current suggestions and publish them on the bus.
async fn refresh_suggestions<A: ConversationApi>(
    api: &A,
    user_id: &str,
    bus: &EventBus<SuggestionsResult>,
) {
    match api.fetch_suggestions(user_id).await {
        Ok(payload) => {
            bus.trigger(NEW_SUGGESTIONS_EVENT, &payload);
        }
        Err(e) => error!("{e}"),
    }
}
