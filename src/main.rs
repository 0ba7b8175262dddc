use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use scratch_ranker::api::{router, ApiState, HealthState};
use scratch_ranker::config::Config;
use scratch_ranker::error::Result;
use scratch_ranker::refresh::Refresher;
use scratch_ranker::scorer::GameScorer;
use scratch_ranker::store::{JsonFileStore, SnapshotStore};

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Stores ---
    let store: Arc<dyn SnapshotStore> =
        Arc::new(JsonFileStore::new(&cfg.data_path, &cfg.history_path));
    info!(
        "Stores: current={} history={}",
        cfg.data_path, cfg.history_path,
    );

    let scorer = Arc::new(GameScorer::new(cfg.policy.clone()));
    let health = Arc::new(HealthState::new());
    info!(
        "[POLICY] weights ev={:.2} remaining={:.2} grand={:.2}",
        scorer.policy().weight_expected_value,
        scorer.policy().weight_remaining,
        scorer.policy().weight_grand,
    );

    let refresher = Refresher::new(
        cfg.clone(),
        Arc::clone(&scorer),
        Arc::clone(&store),
        Arc::clone(&health),
    );

    // --- Optional startup recompute ---
    if cfg.refresh_on_start {
        refresher.refresh_once().await;
    }

    // --- Background refresher ---
    if cfg.refresh_interval_secs > 0 {
        info!("Refresher enabled: every {}s", cfg.refresh_interval_secs);
        tokio::spawn(async move { refresher.run().await });
    } else {
        warn!("REFRESH_INTERVAL_SECS not set, serving stored data only. Run the `scrape` binary to recompute.");
    }

    // --- HTTP API server ---
    let api_state = ApiState {
        store: Arc::clone(&store),
        scorer: Arc::clone(&scorer),
        health: Arc::clone(&health),
        top_n: cfg.top_n,
        movers_limit: cfg.movers_limit,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
