// main.rs
// Axum server wiring: loads configuration from the environment, connects to
// MongoDB, optionally schedules the sync passes, and serves the JSON API.
//
// Endpoints:
// - GET/POST /api/contracts                  -> list / create contracts
// - GET      /api/contracts/{id}             -> one contract
// - POST     /api/contracts/{id}/update      -> edit a contract
// - POST     /api/contracts/{id}/delete      -> delete a contract and its documents
// - POST     /api/contracts/recalc-overdue   -> recompute one contract
// - POST     /api/contracts/sync-overdue     -> recompute every open contract
// - POST     /api/contracts/sync             -> terminate expired leases
// - GET/POST /api/docs/contract-documents    -> stored documents per contract
// - POST     /api/docs/content-proof         -> notice draft from a stored contract
// - GET/POST /api/questions                  -> list / ask legal questions
// - GET      /api/questions/{id}             -> question with its answers
// - POST     /api/questions/{id}/answers     -> add an answer
// - POST     /api/questions/{id}/stage       -> move the case to another stage
// - POST     /api/ai/answer-draft            -> answer draft for a question
// - POST     /api/ai/notice-draft            -> notice draft from free text

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use leasekeeper::{reconcile, routes, state};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("leasekeeper=info")),
        )
        .init();

    let state = Arc::new(
        state::init_state()
            .await
            .context("failed to initialize MongoDB state")?,
    );

    if let Some(interval) = sync_interval()? {
        tracing::info!(seconds = interval.as_secs(), "scheduling background sync");
        tokio::spawn(run_periodic_sync(state.clone(), interval));
    }

    let app = routes::router(state);

    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse()
        .context("BIND_ADDR must be host:port")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn sync_interval() -> Result<Option<Duration>> {
    let Ok(raw) = env::var("SYNC_INTERVAL_SECONDS") else {
        return Ok(None);
    };
    let seconds = raw
        .trim()
        .parse::<u64>()
        .context("SYNC_INTERVAL_SECONDS must be a whole number of seconds")?;
    Ok((seconds > 0).then(|| Duration::from_secs(seconds)))
}

/// Expiry first, then overdue, so a lease that just ended is never marked overdue.
async fn run_periodic_sync(state: Arc<state::AppState>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let today = state.clock.today();
        if let Err(e) = reconcile::sync_expired(state.as_ref(), today).await {
            tracing::error!(error = %e, "lease expiry sync failed");
        }
        if let Err(e) = reconcile::sync_overdue(state.as_ref(), today).await {
            tracing::error!(error = %e, "overdue sync failed");
        }
    }
}
