use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::interval;
use tracing::{error, info};

use crate::api::health::HealthState;
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::fetch_records;
use crate::pipeline::{self, NormalizeStats};
use crate::scorer::GameScorer;
use crate::store::SnapshotStore;
use crate::types::{RawPrizeRecord, Snapshot};

#[derive(Debug)]
pub struct RecomputeReport {
    pub timestamp: String,
    pub games: usize,
    pub normalize: NormalizeStats,
}

/// ISO-8601 local time, seconds precision.
pub fn snapshot_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Score `records`, append the table to history under `timestamp`, then
/// replace the current table with it.
///
/// History goes first: if the append fails nothing has changed. If the later
/// replace fails, the newest snapshot already holds the table that the current
/// store is missing.
pub fn apply_records(
    records: &[RawPrizeRecord],
    scorer: &GameScorer,
    store: &dyn SnapshotStore,
    timestamp: String,
) -> Result<RecomputeReport> {
    let (table, normalize) = pipeline::compute(records, scorer);
    let games = table.len();

    store.append_history(Snapshot { timestamp: timestamp.clone(), data: table.clone() })?;
    if let Err(e) = store.save_current(&table) {
        error!(timestamp = %timestamp, "[REFRESH] snapshot appended but current table not replaced: {e}");
        return Err(e);
    }

    info!(games, timestamp = %timestamp, "[REFRESH] saved current table and appended snapshot");
    Ok(RecomputeReport { timestamp, games, normalize })
}

/// Fetch → pipeline → persist. A failed fetch writes nothing. Scoring and
/// file I/O run on the blocking pool.
pub async fn recompute(
    cfg: &Config,
    scorer: Arc<GameScorer>,
    store: Arc<dyn SnapshotStore>,
) -> Result<RecomputeReport> {
    let (records, _) = fetch_records(cfg).await?;
    let timestamp = snapshot_timestamp();
    tokio::task::spawn_blocking(move || apply_records(&records, &scorer, store.as_ref(), timestamp)).await?
}

/// Background task that re-runs the recompute on a fixed interval.
/// It is the only writer to the store while the server runs.
pub struct Refresher {
    cfg: Config,
    scorer: Arc<GameScorer>,
    store: Arc<dyn SnapshotStore>,
    health: Arc<HealthState>,
}

impl Refresher {
    pub fn new(
        cfg: Config,
        scorer: Arc<GameScorer>,
        store: Arc<dyn SnapshotStore>,
        health: Arc<HealthState>,
    ) -> Self {
        Self { cfg, scorer, store, health }
    }

    pub async fn run(self) {
        let mut ticker = interval(Duration::from_secs(self.cfg.refresh_interval_secs.max(1)));
        ticker.tick().await; // skip immediate first tick; startup refresh is handled by main

        loop {
            ticker.tick().await;
            self.refresh_once().await;
        }
    }

    /// One recompute, recorded in the health state. Errors are logged, not returned.
    pub async fn refresh_once(&self) {
        match recompute(&self.cfg, Arc::clone(&self.scorer), Arc::clone(&self.store)).await {
            Ok(report) => {
                self.health.record_success(now_secs(), report.games);
                info!(
                    "[REFRESH] {} games at {} ({} of {} rows kept)",
                    report.games, report.timestamp, report.normalize.kept, report.normalize.input_rows,
                );
            }
            Err(e) => {
                self.health.record_failure();
                error!("Refresh failed: {e}");
            }
        }
    }
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringPolicy;
    use crate::error::AppError;
    use crate::history::movers;
    use crate::ranker;
    use crate::store::{JsonFileStore, MemoryStore};
    use crate::types::GameSummary;
    use serde_json::json;
    use tempfile::TempDir;

    fn raw(name: &str, prize: &str, unpaid: &str, total: &str) -> RawPrizeRecord {
        RawPrizeRecord {
            game_name: Some(name.to_string()),
            game_number: None,
            prize_amount: Some(json!(prize)),
            unpaid: Some(json!(unpaid)),
            total: Some(json!(total)),
        }
    }

    #[test]
    fn timestamp_is_iso_seconds() {
        let ts = snapshot_timestamp();
        assert_eq!(ts.len(), 19, "{ts}");
        assert_eq!(&ts[10..11], "T");
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%dT%H:%M:%S").is_ok());
    }

    #[test]
    fn apply_records_writes_current_and_history() {
        let store = MemoryStore::new();
        let scorer = GameScorer::new(ScoringPolicy::default());
        let report = apply_records(
            &[raw("A", "$100", "1", "10"), raw("B", "$20", "5", "10")],
            &scorer,
            store.as_ref(),
            "2025-01-01T00:00:00".to_string(),
        )
        .unwrap();

        assert_eq!(report.games, 2);
        let current = store.load_current().unwrap();
        let history = store.load_history().unwrap();
        assert_eq!(current.len(), 2);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].data, current);
    }

    #[test]
    fn two_runs_produce_movers() {
        let store = MemoryStore::new();
        let scorer = GameScorer::new(ScoringPolicy::default());

        apply_records(&[raw("X", "$100", "1", "10")], &scorer, store.as_ref(), "t1".to_string()).unwrap();
        apply_records(
            &[raw("X", "$100", "3", "10"), raw("Y", "$50", "1", "1")],
            &scorer,
            store.as_ref(),
            "t2".to_string(),
        )
        .unwrap();

        let m = movers(&store.load_history().unwrap(), 5).unwrap();
        assert_eq!(m.gainers.len(), 1);
        assert_eq!(m.gainers[0].name, "X");
        assert!((m.gainers[0].change - 20.0).abs() < 1e-9);
    }

    #[test]
    fn empty_dataset_still_records_a_snapshot() {
        let store = MemoryStore::new();
        let scorer = GameScorer::new(ScoringPolicy::default());
        apply_records(&[], &scorer, store.as_ref(), "t".to_string()).unwrap();

        assert_eq!(store.load_history().unwrap().len(), 1);
        let current = store.load_current().unwrap();
        assert!(ranker::best(&current, &scorer).is_err());
    }

    /// Memory store whose history append always fails.
    struct BrokenHistory(Arc<MemoryStore>);

    impl SnapshotStore for BrokenHistory {
        fn load_current(&self) -> Result<Vec<GameSummary>> {
            self.0.load_current()
        }

        fn save_current(&self, table: &[GameSummary]) -> Result<()> {
            self.0.save_current(table)
        }

        fn load_history(&self) -> Result<crate::types::History> {
            self.0.load_history()
        }

        fn append_history(&self, _snapshot: Snapshot) -> Result<()> {
            Err(AppError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn failed_append_leaves_current_table_untouched() {
        let inner = MemoryStore::new();
        let store = BrokenHistory(Arc::clone(&inner));
        let scorer = GameScorer::new(ScoringPolicy::default());

        let err = apply_records(&[raw("A", "$100", "1", "10")], &scorer, &store, "t".to_string());
        assert!(err.is_err());
        assert!(inner.load_current().unwrap().is_empty());
    }

    #[test]
    fn overflowing_prize_row_does_not_wipe_history() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"), dir.path().join("history.json"));
        let scorer = GameScorer::new(ScoringPolicy::default());
        let huge_prize = format!("1{}", "0".repeat(308));

        apply_records(&[raw("A", "$100", "1", "10")], &scorer, &store, "t1".to_string()).unwrap();
        apply_records(&[raw("A", "$100", "2", "10")], &scorer, &store, "t2".to_string()).unwrap();
        apply_records(
            &[raw("A", "$100", "2", "10"), raw("Huge", &huge_prize, "2", "1")],
            &scorer,
            &store,
            "t3".to_string(),
        )
        .unwrap();
        assert_eq!(store.load_history().unwrap().len(), 3);

        apply_records(&[raw("A", "$100", "3", "10")], &scorer, &store, "t4".to_string()).unwrap();
        let history = store.load_history().unwrap();
        assert_eq!(history.len(), 4);
        let huge = history[2].data.iter().find(|g| g.name == "Huge").unwrap();
        assert_eq!(huge.expected_value, 0.0);
    }
}
