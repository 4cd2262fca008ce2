// initai-monitor: realtime suggestion notifications for Init.ai conversations

pub mod authorizer;
pub mod bus;
pub mod error;
pub mod monitor;
pub mod protocol;
pub mod socket;
pub mod validate;

pub use authorizer::{ApiChannelAuthorizer, ChannelAuthorizer};
pub use bus::{EventBus, Handler};
pub use error::Error;
pub use monitor::{MonitorClient, MonitorState, NEW_SUGGESTIONS_EVENT, channel_name};
pub use protocol::{ChannelAuth, PusherEvent};
pub use socket::{ConnectionState, PusherSocket, SocketConfig};
pub use validate::{MonitorConfig, validate_monitor_config};
