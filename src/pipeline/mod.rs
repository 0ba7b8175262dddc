pub mod aggregator;
pub mod normalizer;

use tracing::{debug, info};

use crate::scorer::GameScorer;
use crate::types::{GameSummary, RawPrizeRecord};

pub use aggregator::{aggregate, GameTotals};
pub use normalizer::{normalize_all, NormalizeStats};

/// Raw records → normalized tiers → per-game totals → scored table.
/// Pure and synchronous; invalid rows are dropped and only counted.
pub fn compute(raw: &[RawPrizeRecord], scorer: &GameScorer) -> (Vec<GameSummary>, NormalizeStats) {
    let (tiers, stats) = normalize_all(raw);
    let groups = aggregate(&tiers);
    let table = scorer.score(&groups);

    info!(
        input_rows = stats.input_rows,
        kept = stats.kept,
        games = table.len(),
        "[PIPELINE] {} rows → {} tiers → {} games",
        stats.input_rows,
        stats.kept,
        table.len(),
    );
    if stats.rejected() > 0 {
        debug!(
            "[PIPELINE] rejected: missing_name={} prize<=0={} total<=0={}",
            stats.rejected_missing_name, stats.rejected_prize, stats.rejected_total,
        );
    }

    (table, stats)
}
