//! Command dispatch: bridges CLI args -> API calls -> output formatting.

pub mod config_cmd;
pub mod conversation;
pub mod monitor;

use std::path::PathBuf;
use std::sync::Arc;

use initai_api::ApiClient;
use initai_config::Environment;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// A configured API client plus the environment it was built from.
pub struct Session {
    pub env: Environment,
    pub api: Arc<ApiClient>,
}

pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        // Config commands never need a token
        Command::Config(args) => config_cmd::handle(&args, global),

        Command::Send(args) => conversation::send(&connect(global)?, args, global).await,
        Command::Messages(args) => {
            conversation::messages(&connect(global)?, &args.user_id, global).await
        }
        Command::Suggestions(args) => {
            conversation::suggestions(&connect(global)?, &args.user_id, global).await
        }
        Command::Event(args) => conversation::event(&connect(global)?, args, global).await,
        Command::Monitor(args) => monitor::handle(connect(global)?, args, global).await,
    }
}

pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(initai_config::config_path)
}

/// Resolve the environment: config file and `INITAI_*`, then CLI flags.
pub fn load_environment(global: &GlobalOpts) -> Result<Environment, CliError> {
    let mut env = initai_config::load_from(&config_file(global))?;

    if let Some(api) = global.api {
        env.api = api;
    }
    if let Some(ref base_url) = global.base_url {
        env.api_base_url = Some(base_url.clone());
    }
    if let Some(timeout) = global.timeout {
        env.timeout = Some(timeout);
    }

    env.validate()?;
    Ok(env)
}

fn connect(global: &GlobalOpts) -> Result<Session, CliError> {
    let env = load_environment(global)?;
    let config = env.client_config(global.token.as_deref())?;
    let api = ApiClient::with_transport(config, &env.transport())?;

    tracing::debug!(base_url = api.base_url(), "API client ready");
    Ok(Session {
        env,
        api: Arc::new(api),
    })
}
