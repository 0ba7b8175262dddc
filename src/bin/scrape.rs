//! One-shot recompute: fetch the dataset, score it, replace the current table
//! and append a snapshot to the history.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scratch_ranker::config::Config;
use scratch_ranker::refresh::recompute;
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

    let store: Arc<dyn SnapshotStore> = Arc::new(JsonFileStore::new(&cfg.data_path, &cfg.history_path));
    let scorer = Arc::new(GameScorer::new(cfg.policy.clone()));

    match recompute(&cfg, scorer, store).await {
        Ok(report) => info!(
            "Saved {} games to {} and appended snapshot {} to {}",
            report.games,
            cfg.data_path,
            report.timestamp,
            cfg.history_path,
        ),
        Err(e) => {
            error!("Scrape failed: {e}");
            std::process::exit(1);
        }
    }
}
