use std::collections::{HashMap, HashSet};

use crate::error::{AppError, Result};
use crate::ranker::{bottom_by, top_by};
use crate::types::{Mover, Movers, Snapshot};

/// Expected-value movers between the two most recent snapshots.
///
/// Games present in only one of the two snapshots are skipped. Joined rows
/// follow the newer snapshot's order, which is also the tie-break order.
pub fn movers(history: &[Snapshot], limit: usize) -> Result<Movers> {
    let [.., prev, latest] = history else {
        return Err(AppError::InsufficientHistory);
    };

    let joined = join_on_name(prev, latest);
    if joined.is_empty() {
        return Ok(Movers::default());
    }

    Ok(Movers {
        gainers: top_by(&joined, limit, |m| m.change)?,
        losers: bottom_by(&joined, limit, |m| m.change)?,
    })
}

/// Inner join on `name`. If a snapshot lists a name twice, the first row wins.
fn join_on_name(prev: &Snapshot, latest: &Snapshot) -> Vec<Mover> {
    let mut prev_ev: HashMap<&str, f64> = HashMap::with_capacity(prev.data.len());
    for g in &prev.data {
        prev_ev.entry(g.name.as_str()).or_insert(g.expected_value);
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(latest.data.len());
    latest
        .data
        .iter()
        .filter(|g| seen.insert(g.name.as_str()))
        .filter_map(|g| {
            let before = *prev_ev.get(g.name.as_str())?;
            Some(Mover {
                name: g.name.clone(),
                expected_value_now: g.expected_value,
                expected_value_prev: before,
                change: g.expected_value - before,
            })
        })
        .collect()
}
