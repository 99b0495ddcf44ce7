//! Kyber Key Exchange Server
//!
//! HTTP front end for post-quantum KEM key exchange sessions.

mod config;
mod error;
mod routes;

use std::sync::Arc;

use clap::Parser;
use kem_session::{KeyExchangeService, SessionStore, select_backend};
use tracing::{info, warn};

use crate::config::Args;
use crate::routes::{AppState, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::new(&args.log_level)
            .add_directive("tower_http=debug".parse()?),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Kyber Key Exchange Server");

    let kem = select_backend(args.kem_backend.into())?;
    let status = kem.status();
    if !status.is_secure() {
        warn!("KEM backend is simulated: key exchange is NOT SECURE");
    }

    if args.expose_private_key {
        warn!("Private keys will be returned from /generate-keypair");
        warn!("This is NOT suitable for production use!");
    }

    let store_config = args.store_config();
    store_config.validate()?;
    let store = Arc::new(SessionStore::new(store_config));
    info!("Session TTL: {}s", store.config().default_ttl.as_secs());

    let service = Arc::new(KeyExchangeService::new(
        kem,
        store.clone(),
        args.exchange_config(),
    ));
    let app = router(AppState::new(service));

    info!("Listening on {}", args.bind);
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Wipe remaining secrets before exit
    store.clear();
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
