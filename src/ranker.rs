//! Ordered top-N views over a scored table.

use std::cmp::Ordering;

use crate::error::{AppError, Result};
use crate::scorer::GameScorer;
use crate::types::{GameSummary, RankKey, Recommendation};

/// The `n` rows with the largest key, descending. Rows with equal keys keep
/// their relative input order. Empty input is `EmptyDataset`.
pub fn top_by<T, F>(rows: &[T], n: usize, key: F) -> Result<Vec<T>>
where
    T: Clone,
    F: Fn(&T) -> f64,
{
    if rows.is_empty() {
        return Err(AppError::EmptyDataset);
    }
    let mut keyed: Vec<(f64, &T)> = rows.iter().map(|r| (key(r), r)).collect();
    // sort_by is stable
    keyed.sort_by(|a, b| desc(a.0, b.0));
    Ok(keyed.into_iter().take(n).map(|(_, r)| r.clone()).collect())
}

/// Same as [`top_by`] but ascending.
pub fn bottom_by<T, F>(rows: &[T], n: usize, key: F) -> Result<Vec<T>>
where
    T: Clone,
    F: Fn(&T) -> f64,
{
    top_by(rows, n, |r| -key(r))
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// `top_n(table, key, n)` over game summaries.
pub fn top_n(table: &[GameSummary], key: RankKey, n: usize, scorer: &GameScorer) -> Result<Vec<GameSummary>> {
    match key {
        RankKey::Composite => {
            let scores = scorer.composite(table);
            let indexed: Vec<(usize, f64)> = scores.iter().map(|c| c.score).enumerate().collect();
            let picked = top_by(&indexed, n, |&(_, score)| score)?;
            Ok(picked.into_iter().map(|(i, _)| table[i].clone()).collect())
        }
        _ => top_by(table, n, |g| key.row_value(g).unwrap_or(0.0)),
    }
}

/// Single best game by composite score, with its score components.
pub fn best(table: &[GameSummary], scorer: &GameScorer) -> Result<Recommendation> {
    let scores = scorer.composite(table);
    let indexed: Vec<usize> = (0..table.len()).collect();
    let top = top_by(&indexed, 1, |&i| scores[i].score)?;
    let i = top.first().copied().ok_or(AppError::EmptyDataset)?;
    let c = scores[i];

    Ok(Recommendation {
        game: table[i].clone(),
        value_norm: c.value_norm,
        prize_norm: c.prize_norm,
        grand_norm: c.grand_norm,
        smart_score: c.score,
    })
}
