//! `monitor`: stream new suggestion sets for one user until interrupted.

use std::sync::Arc;

use tokio::sync::mpsc;

use initai_api::SuggestionsResult;
use initai_monitor::{MonitorClient, MonitorConfig, NEW_SUGGESTIONS_EVENT};

use crate::cli::{GlobalOpts, MonitorArgs};
use crate::commands::Session;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    session: Session,
    args: MonitorArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut config = MonitorConfig::new(Arc::clone(&session.api), args.user_id)
        .with_pusher_app_key(
            args.pusher_app_key
                .unwrap_or_else(|| session.env.pusher_app_key().to_owned()),
        );
    if let Some(host) = args.pusher_host {
        config = config.with_pusher_host(host, !args.insecure);
    }

    let monitor = MonitorClient::create(config).await?;

    // Handlers run on the socket task; hand payloads to this task for printing.
    let (tx, mut rx) = mpsc::unbounded_channel::<SuggestionsResult>();
    monitor.on_fn(NEW_SUGGESTIONS_EVENT, move |payload| {
        if tx.send(payload.clone()).is_err() {
            tracing::debug!("suggestion dropped, printer has exited");
        }
    })?;

    eprintln!("Watching {} (Ctrl-C to stop)", monitor.channel_name());

    let mut received = 0usize;
    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            payload = rx.recv() => {
                let Some(payload) = payload else { break Ok(()) };
                if let Err(e) = output::print(&payload, global.output) {
                    break Err(e);
                }
                received += 1;
                if args.count.is_some_and(|limit| received >= limit) {
                    break Ok(());
                }
            }
        }
    };

    monitor.destroy();
    result
}
