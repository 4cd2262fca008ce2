//! Clap derive structures for the `initai` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use initai_api::{ApiProfile, SenderRole};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// initai -- drive the Init.ai conversation API from a terminal
#[derive(Debug, Parser)]
#[command(
    name = "initai",
    version,
    about = "Send messages, fetch suggestions and watch realtime updates on Init.ai",
    long_about = "A command-line harness for the Init.ai conversation API.\n\n\
        Every request is validated locally before it is sent. The `monitor`\n\
        command subscribes to a user's presence channel and prints each new\n\
        suggestion set as it arrives.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// API bearer token
    #[arg(long, short = 't', env = "INITAI_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// API deployment (staging or production)
    #[arg(long, global = true)]
    pub api: Option<ApiProfile>,

    /// API base URL (overrides the deployment's)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Config file to read instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "json", global = true)]
    pub output: OutputFormat,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a message into a user's current conversation
    Send(SendArgs),

    /// List the messages of a user's current conversation
    Messages(UserArgs),

    /// Show the current reply suggestions for a user
    Suggestions(UserArgs),

    /// Trigger an inbound event for a user
    Event(EventArgs),

    /// Print new suggestion sets for a user as they arrive
    Monitor(MonitorArgs),

    /// Inspect or create the configuration file
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct UserArgs {
    /// End-user id
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ContentKind {
    #[default]
    Text,
    Image,
    Postback,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// End-user id
    pub user_id: String,

    /// Message text (postback label for `--kind postback`)
    pub text: Option<String>,

    /// Kind of message to send
    #[arg(long, short = 'k', value_enum, default_value_t)]
    pub kind: ContentKind,

    /// Who the message is attributed to
    #[arg(long, short = 'r')]
    pub role: Option<SenderRole>,

    /// Image URL (image messages)
    #[arg(long)]
    pub image_url: Option<String>,

    /// Image MIME type (image messages)
    #[arg(long)]
    pub mime_type: Option<String>,

    /// Alternative text (image messages)
    #[arg(long)]
    pub alt_text: Option<String>,

    /// Target stream (postback messages)
    #[arg(long)]
    pub stream: Option<String>,

    /// JSON payload for the stream (postback messages)
    #[arg(long)]
    pub data: Option<String>,
}

#[derive(Debug, Args)]
pub struct EventArgs {
    /// End-user id
    pub user_id: String,

    /// Event type, e.g. `user_clicked_button`
    pub event_type: String,

    /// JSON object attached to the event
    #[arg(long)]
    pub data: Option<String>,
}

#[derive(Debug, Args)]
pub struct MonitorArgs {
    /// End-user id
    pub user_id: String,

    /// Push service app key (overrides the deployment's)
    #[arg(long)]
    pub pusher_app_key: Option<String>,

    /// Push service host, e.g. a local test server
    #[arg(long)]
    pub pusher_host: Option<String>,

    /// Use plain `ws://` with `--pusher-host`
    #[arg(long, requires = "pusher_host")]
    pub insecure: bool,

    /// Exit after this many suggestion sets
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved configuration (token redacted)
    Show,

    /// Print the config file location
    Path,

    /// Write a config file with the chosen deployment
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
