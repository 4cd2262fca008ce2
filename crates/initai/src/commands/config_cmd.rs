//! Config subcommand handlers.

use serde_json::json;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::{config_file, load_environment};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let env = load_environment(global)?;
            let has_token = global.token.is_some() || env.token.is_some();
            output::print(
                &json!({
                    "api": env.api,
                    "base_url": env.base_url(),
                    "pusher_app_key": env.pusher_app_key(),
                    "timeout": env.timeout,
                    "token": if has_token { "(set)" } else { "(unset)" },
                    "version": initai_config::VERSION,
                }),
                global.output,
            )
        }

        ConfigCommand::Path => {
            println!("{}", config_file(global).display());
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = config_file(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let env = initai_config::Environment {
                api: global.api.unwrap_or_default(),
                api_base_url: global.base_url.clone(),
                timeout: global.timeout,
                ..initai_config::Environment::default()
            };
            initai_config::save_to(&env, &path)?;
            eprintln!("Wrote {}", path.display());
            Ok(())
        }
    }
}
