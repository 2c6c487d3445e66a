use std::process;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use subpub::broker::Broker;
use subpub::config::load_config;
use subpub::transport::websocket::serve;
use subpub::utils::logging;

#[tokio::main]
async fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            process::exit(1);
        }
    };
    logging::init(&config.logger.level, &config.logger.format);
    info!(
        level = %config.logger.level,
        format = %config.logger.format,
        "logger initialized"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let timeout = Duration::from_secs(config.graceful_shutdown_timeout_secs);
    let broker = Arc::new(Broker::new());

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %addr, error = %e, "failed to bind");
            process::exit(1);
        }
    };
    info!(addr = %addr, "server listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (session_done_tx, mut session_done_rx) = mpsc::channel::<()>(1);
    let server = tokio::spawn(serve(
        listener,
        Arc::clone(&broker),
        shutdown_rx,
        session_done_tx,
    ));

    shutdown_signal().await;
    info!("shutdown signal received");

    let _ = shutdown_tx.send(true);
    let _ = server.await;

    // Two-race drain: either every session ends and the channel closes,
    // or the timer wins and we stop abruptly.
    info!("starting graceful shutdown");
    tokio::select! {
        _ = session_done_rx.recv() => info!("all sessions drained"),
        _ = tokio::time::sleep(timeout) => warn!("graceful shutdown timed out, forcing stop"),
    }

    let drained = tokio::task::spawn_blocking(move || broker.shutdown(timeout)).await;
    if let Ok(Err(e)) = drained {
        warn!(error = %e, "broker did not drain cleanly");
    }
    info!("server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
