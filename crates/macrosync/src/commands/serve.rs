//! `serve`: webhook listener plus the uptime heartbeat.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info, warn};

use macrosync::routes::build_router;
use macrosync::state::AppState;
use macrosync::sync::SyncCommand;
use macrosync_config::Config;
use macrosync_core::Heartbeat;

use crate::bootstrap;
use crate::cli::ServeArgs;
use crate::error::CliError;

pub async fn handle(args: &ServeArgs, config: &Config) -> Result<(), CliError> {
    let addr: SocketAddr = match args.bind.as_deref() {
        Some(bind) => bind.parse().map_err(|e| CliError::Validation {
            field: "--bind".into(),
            reason: format!("{e}: {bind}"),
        })?,
        None => config.bind_addr()?,
    };

    let services = bootstrap::connect(config).await?;
    services.announce_start().await;

    let sync = SyncCommand::new(config.sync.command.clone());
    match sync {
        Some(ref cmd) => info!(program = cmd.program(), "full-sync command enabled"),
        None => info!("no sync.command configured; /webhook/changes only reports"),
    }

    let cancel = CancellationToken::new();
    let heartbeat = config.heartbeat_interval().map(|interval| {
        info!(interval_secs = interval.as_secs(), "starting heartbeat");
        Arc::new(Heartbeat::new(
            interval,
            Arc::clone(&services.notifier),
            Arc::clone(&services.monitoring),
        ))
        .spawn(cancel.clone())
    });

    let state = Arc::new(AppState::new(services.driver, sync));
    let app = build_router(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "macrosync listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await;

    cancel.cancel();
    if let Some(handle) = heartbeat {
        if let Err(e) = handle.await {
            warn!(error = %e, "heartbeat task ended abnormally");
        }
    }
    served.map_err(|e| CliError::Server(e.to_string()))
}

async fn shutdown_signal(cancel: CancellationToken) {
    tokio::select! {
        res = tokio::signal::ctrl_c() => match res {
            Ok(()) => info!("shutdown requested"),
            Err(e) => error!(error = %e, "failed to listen for ctrl-c; shutting down"),
        },
        () = cancel.cancelled() => {}
    }
    cancel.cancel();
}
