//! `gmailsend` - send Gmail with attachments over a small HTTP API
//!
//! Reads `GMAILSEND_*` settings (and an optional `.env`), loads the Google
//! client secrets and serves until Ctrl-C.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use gmailsend::{AppState, router};
use gmailsend_core::{Config, Services};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gmailsend=debug,gmailsend_core=debug,gmailsend_oauth=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting gmailsend");
    if let Some(path) = dotenv {
        debug!(path = %path.display(), "Loaded .env");
    }

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr;
    let services = Services::from_config(&config)?;
    services.prepare().await?;
    let state = AppState::new(config, services)?;

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;
    let ctrl_c = async {
        signal::ctrl_c().await.ok();
    };
    #[cfg(unix)]
    let term = async {
        if let Ok(mut s) = signal::unix::signal(signal::unix::SignalKind::terminate()) {
            s.recv().await;
        }
    };
    #[cfg(not(unix))]
    let term = std::future::pending::<()>();
    tokio::select! {
        () = ctrl_c => {},
        () = term => {},
    }
    info!("Shutdown requested");
}
