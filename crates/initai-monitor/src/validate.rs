// Monitor configuration and its construction-time checks.

use std::sync::Arc;

use initai_api::{ConversationApi, Validation};

/// Everything a [`MonitorClient`](crate::MonitorClient) needs to start.
pub struct MonitorConfig<A> {
    /// Shared API collaborator. The monitor never creates or tears it down.
    pub api_client: Option<Arc<A>>,
    pub user_id: String,
    /// Push application key. Defaults to the staging profile's key.
    pub pusher_app_key: Option<String>,
    /// Push service host override, e.g. a local test server.
    pub pusher_host: Option<String>,
    /// Use TLS for the socket. Only honored together with `pusher_host`.
    pub encrypted: bool,
}

impl<A> Default for MonitorConfig<A> {
    fn default() -> Self {
        Self {
            api_client: None,
            user_id: String::new(),
            pusher_app_key: None,
            pusher_host: None,
            encrypted: true,
        }
    }
}

impl<A: ConversationApi> MonitorConfig<A> {
    pub fn new(api_client: Arc<A>, user_id: impl Into<String>) -> Self {
        Self {
            api_client: Some(api_client),
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn with_pusher_app_key(mut self, key: impl Into<String>) -> Self {
        self.pusher_app_key = Some(key.into());
        self
    }

    pub fn with_pusher_host(mut self, host: impl Into<String>, encrypted: bool) -> Self {
        self.pusher_host = Some(host.into());
        self.encrypted = encrypted;
        self
    }
}

/// Check a monitor configuration. `None` means none was supplied.
pub fn validate_monitor_config<A: ConversationApi>(
    config: Option<&MonitorConfig<A>>,
) -> Validation {
    let Some(config) = config else {
        return Validation::invalid("A valid configuration object is required.");
    };

    if config.user_id.is_empty() {
        return Validation::invalid("A valid `userId` string is required.");
    }

    if config.api_client.is_none() {
        return Validation::invalid("A valid `apiClient` is required.");
    }

    Validation::Valid
}
