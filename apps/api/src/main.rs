mod config;
mod db;
mod errors;
mod llm_client;
mod matching;
mod models;
mod routes;
mod state;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::matching::cache::ComparisonCache;
use crate::matching::evaluator::MatchEvaluator;
use crate::matching::registry::{PgSubjectRegistry, PgTargetRegistry};
use crate::matching::runner::BatchMatchRunner;
use crate::matching::scheduler::WeeklyScheduler;
use crate::matching::scorer::LlmScorer;
use crate::matching::store::PgComparisonStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobmatch v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.database_max_connections).await?;
    sqlx::migrate!().run(&db).await?;
    info!("Database migrations applied");

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let evaluator = MatchEvaluator::new(
        Arc::new(LlmScorer(llm)),
        config.match_threshold,
        config.scorer_timeout,
    );
    let cache = ComparisonCache::new(Arc::new(PgComparisonStore::new(db.clone())), evaluator);
    let runner = Arc::new(BatchMatchRunner::new(
        Arc::new(PgSubjectRegistry::new(db.clone())),
        Arc::new(PgTargetRegistry::new(db)),
        cache,
    ));
    info!(
        "Matching configured (threshold: {}, scorer timeout: {:?})",
        config.match_threshold, config.scorer_timeout
    );

    let mut scheduler = WeeklyScheduler::new(config.weekly_schedule);
    if config.weekly_match_enabled {
        scheduler.start(runner.clone());
        if let Some(first) = scheduler.first_run_at() {
            info!(
                "Weekly match scheduler {:?}, first run at {}",
                scheduler.status(),
                first.to_rfc3339()
            );
        }
    } else {
        info!("Weekly match scheduler disabled (set ENABLE_WEEKLY_MATCH=true to enable)");
    }

    let state = AppState { runner };

    // Build router
    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop();
    info!("Shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
