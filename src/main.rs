use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use tracing::info;

mod config;
mod dashboard;
mod scoreboard;
mod session;

use config::Config;
use dashboard::AppState;
use session::SessionStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let sessions = SessionStore::new(config.max_sessions, config.session_ttl());
    info!(
        "Session store ready (max {} sessions, idle TTL {:?})",
        config.max_sessions,
        config.session_ttl()
    );

    // Background sweep of idle sessions
    {
        let sessions = sessions.clone();
        let sweep_interval = config.sweep_interval();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                sessions.evict_idle(Instant::now());
            }
        });
    }

    let app = dashboard::router(AppState {
        sessions,
        add_amounts: config.add_amounts.clone(),
        subtract_amounts: config.subtract_amounts.clone(),
    });
    let addr = config.socket_addr()?;
    info!("Scoreboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve until shutdown
    axum::serve(listener, app).await?;

    Ok(())
}
