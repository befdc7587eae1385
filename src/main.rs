//! # Autotrader — price-driven trade automation for a single instrument
//!
//! ```text
//!                       ┌───────────── AppState ─────────────┐
//!  ┌─────────────┐      │ ├─ alerts    (AlertRegistry)       │
//!  │  Scheduler  │ ───▶ │ ├─ strategy  (StrategyState)       │ ──▶ PriceFeed
//!  │ alert  60s  │      │ ├─ ledger    (trades.log)          │ ──▶ Brokerage
//!  │ strat 300s  │      │ ├─ retry     (backoff gate)        │ ──▶ Notifier
//!  └─────────────┘      │ └─ broadcast_tx ─────────────────┐ │
//!                       └──────────────────────────────────│─┘
//!  ┌─────────────┐  /api/alerts /api/strategy /api/trades  │
//!  │  Callers    │ ─────────────────────────────▶ commands │
//!  └─────────────┘                                         │
//!  ┌─────────────┐  ws://host/ws/monitor  ◀────────────────┘
//!  │  Dashboard  │  GET /api/health
//!  └─────────────┘
//! ```

use tokio::sync::watch;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod adapters;
mod auth;
mod commands;
mod config;
mod engine;
mod error;
mod events;
mod ledger;
mod models;
mod registry;
mod routes;
mod state;

use config::Config;
use state::build_state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env ──────────────────────────────────────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Structured logging ─────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("autotrader=debug".parse()?)
                .add_directive("tower_http=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    info!(r#"

  ╔═══════════════════════════════════════════════════════╗
  ║              AUTOTRADER — Trade Automation            ║
  ║        Alerts · MA Crossover · Ledger · Monitor       ║
  ╚═══════════════════════════════════════════════════════╝"#);

    // ── 3. Config + collaborators ─────────────────────────────────────────────
    let config = Config::from_env()?;
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;
    let adapters = adapters::build_adapters(&config, client)?;
    let bind_addr = config.bind_addr;

    info!(
        symbol   = %config.symbol,
        broker   = ?config.broker,
        notifier = ?config.notifier,
        admin    = config.admin_id.is_some(),
        api_key  = config.api_key.is_some(),
        "⚙️ Configuration loaded"
    );

    // ── 4. Shared state + scheduler ───────────────────────────────────────────
    let state = build_state(config, adapters);
    info!(path = %state.ledger.path().display(), "📒 Trade ledger");
    let scheduler = engine::scheduler::start(&state);

    // ── 5. CORS ───────────────────────────────────────────────────────────────
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // ── 6. Router ─────────────────────────────────────────────────────────────
    let app = routes::build_router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // ── 7. Bind & Serve ───────────────────────────────────────────────────────
    info!(addr = ?bind_addr, "🚀 Autotrader starting");
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.shutdown_signal()))
        .await?;

    // ── 8. Drain ──────────────────────────────────────────────────────────────
    scheduler.stop().await;
    info!("👋 Autotrader stopped");
    Ok(())
}

/// Resolves on Ctrl-C or an admin stop request.
async fn shutdown_signal(admin_stop: watch::Receiver<bool>) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Ctrl-C handler failed");
            }
            info!("Ctrl-C received");
        }
        _ = admin_stopped(admin_stop) => {
            info!("Admin stop received");
        }
    }
}

async fn admin_stopped(mut admin_stop: watch::Receiver<bool>) {
    loop {
        let stopped = *admin_stop.borrow_and_update();
        if stopped {
            return;
        }
        if admin_stop.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
