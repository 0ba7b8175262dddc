use tracing::warn;

use crate::config::ScoringPolicy;
use crate::pipeline::aggregator::GameTotals;
use crate::types::GameSummary;

/// Normalized components of the composite ranking score for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeScore {
    pub value_norm: f64,
    pub prize_norm: f64,
    pub grand_norm: f64,
    pub score: f64,
}

/// Turns aggregated per-game totals into scored summaries.
pub struct GameScorer {
    policy: ScoringPolicy,
}

impl GameScorer {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Estimated ticket price from the top prize. First threshold met wins;
    /// never below the policy floor.
    pub fn ticket_price_est(&self, top_prize: f64) -> f64 {
        self.policy
            .price_tiers
            .iter()
            .find(|(threshold, _)| top_prize >= *threshold)
            .map(|&(_, price)| price)
            .unwrap_or(self.policy.price_floor)
            .max(self.policy.price_floor)
    }

    /// Score every group. `value_score` is relative to the best
    /// `ev_per_dollar` in this batch, so the whole dataset must be passed at once.
    ///
    /// Rows come back ordered by `expected_value` descending; ties keep the
    /// input order.
    pub fn score(&self, groups: &[GameTotals]) -> Vec<GameSummary> {
        let mut rows: Vec<GameSummary> = groups.iter().map(|g| self.score_one(g)).collect();

        let max_epd = rows.iter().map(|r| r.ev_per_dollar).fold(f64::NEG_INFINITY, f64::max);
        let base = if max_epd.is_finite() && max_epd > 0.0 { max_epd } else { 1.0 };
        for row in &mut rows {
            row.value_score = (row.ev_per_dollar / base).clamp(0.0, 1.0);
        }

        rows.sort_by(|a, b| {
            b.expected_value
                .partial_cmp(&a.expected_value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        rows
    }

    fn score_one(&self, g: &GameTotals) -> GameSummary {
        let remaining_ratio = if g.total_prizes == 0 {
            0.0
        } else {
            (g.remaining_prizes as f64 / g.total_prizes as f64).clamp(0.0, 1.0)
        };
        let ticket_price_est = self.ticket_price_est(g.top_prize);
        let ev_raw = if g.ev_raw.is_finite() {
            g.ev_raw
        } else {
            warn!(game = %g.name, ev_raw = g.ev_raw, "[PIPELINE] non-finite EV, scoring as 0");
            0.0
        };
        let ev_per_dollar = ev_raw / ticket_price_est;

        GameSummary {
            name: g.name.clone(),
            game_number: g.game_number,
            top_prize: g.top_prize,
            ticket_price_est,
            ev_raw,
            expected_value: ev_per_dollar,
            ev_per_dollar,
            remaining_prizes: g.remaining_prizes,
            total_prizes: g.total_prizes,
            remaining_ratio,
            grand_prizes_remaining: g.grand_prizes_remaining,
            value_score: 0.0,
        }
    }

    /// Composite score for every row, aligned with `table`.
    pub fn composite(&self, table: &[GameSummary]) -> Vec<CompositeScore> {
        let ev: Vec<f64> = table.iter().map(|r| r.expected_value).collect();
        let remaining: Vec<f64> = table.iter().map(|r| r.remaining_prizes as f64).collect();
        let grand: Vec<f64> = table.iter().map(|r| r.grand_prizes_remaining as f64).collect();

        let ev = min_max_normalize(&ev);
        let remaining = min_max_normalize(&remaining);
        let grand = min_max_normalize(&grand);

        ev.iter()
            .zip(&remaining)
            .zip(&grand)
            .map(|((&value_norm, &prize_norm), &grand_norm)| CompositeScore {
                value_norm,
                prize_norm,
                grand_norm,
                score: self.policy.weight_expected_value * value_norm
                    + self.policy.weight_remaining * prize_norm
                    + self.policy.weight_grand * grand_norm,
            })
            .collect()
    }
}

/// `(x - min) / (max - min)`. A flat column, or one without a finite range,
/// normalizes to all zeros.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !range.is_finite() || range <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| ((v - min) / range).clamp(0.0, 1.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(name: &str, top_prize: f64, ev_raw: f64, remaining: u64, total: u64, grand: u64) -> GameTotals {
        GameTotals {
            name: name.to_string(),
            game_number: 0,
            remaining_prizes: remaining,
            total_prizes: total,
            top_prize,
            ev_raw,
            grand_prizes_remaining: grand,
        }
    }

    fn scorer() -> GameScorer {
        GameScorer::new(ScoringPolicy::default())
    }

    #[test]
    fn ticket_price_thresholds() {
        let s = scorer();
        assert_eq!(s.ticket_price_est(25_000_000.0), 50.0);
        assert_eq!(s.ticket_price_est(20_000_000.0), 50.0);
        assert_eq!(s.ticket_price_est(10_000_000.0), 30.0);
        assert_eq!(s.ticket_price_est(5_000_000.0), 20.0);
        assert_eq!(s.ticket_price_est(2_000_000.0), 10.0);
        assert_eq!(s.ticket_price_est(500_000.0), 5.0);
        assert_eq!(s.ticket_price_est(1_000_000.0), 5.0);
        assert_eq!(s.ticket_price_est(20_000.0), 2.0);
        assert_eq!(s.ticket_price_est(19_999.99), 1.0);
        assert_eq!(s.ticket_price_est(0.0), 1.0);
    }

    #[test]
    fn ticket_price_is_monotonic_and_at_least_one() {
        let s = scorer();
        let mut prev = 0.0;
        let mut prize = 1.0;
        while prize < 1e9 {
            let price = s.ticket_price_est(prize);
            assert!(price >= 1.0);
            assert!(price >= prev, "price dropped at top_prize={prize}");
            prev = price;
            prize *= 1.37;
        }
    }

    #[test]
    fn empty_price_table_falls_back_to_floor() {
        let s = GameScorer::new(ScoringPolicy { price_tiers: Vec::new(), ..Default::default() });
        assert_eq!(s.ticket_price_est(50_000_000.0), 1.0);
    }

    #[test]
    fn scores_two_game_scenario() {
        let rows = scorer().score(&[
            totals("A", 500.0, 60.0, 3, 30, 2),
            totals("B", 1_000_000.0, 100_000.0, 5, 50, 5),
        ]);
        assert_eq!(rows[0].name, "B");

        let b = &rows[0];
        assert_eq!(b.ticket_price_est, 5.0);
        assert_eq!(b.ev_per_dollar, 20_000.0);
        assert_eq!(b.expected_value, b.ev_per_dollar);
        assert_eq!(b.value_score, 1.0);
        assert!((b.remaining_ratio - 0.1).abs() < 1e-12);

        let a = &rows[1];
        assert_eq!(a.ticket_price_est, 1.0);
        assert_eq!(a.ev_per_dollar, 60.0);
        assert!((a.value_score - 60.0 / 20_000.0).abs() < 1e-12);
    }

    #[test]
    fn ratios_and_value_scores_stay_in_unit_interval() {
        let rows = scorer().score(&[
            totals("zero-total", 10.0, 0.0, 0, 0, 0),
            totals("overclaimed", 10.0, 30.0, 30, 10, 30),
            totals("normal", 30_000.0, 12.0, 4, 40, 1),
        ]);
        for r in &rows {
            assert!((0.0..=1.0).contains(&r.remaining_ratio), "{}: {}", r.name, r.remaining_ratio);
            assert!((0.0..=1.0).contains(&r.value_score), "{}: {}", r.name, r.value_score);
        }
        let zero = rows.iter().find(|r| r.name == "zero-total").unwrap();
        assert_eq!(zero.remaining_ratio, 0.0);
    }

    #[test]
    fn all_zero_ev_keeps_value_scores_finite() {
        let rows = scorer().score(&[totals("A", 10.0, 0.0, 0, 5, 0), totals("B", 20.0, 0.0, 0, 5, 0)]);
        assert!(rows.iter().all(|r| r.value_score == 0.0));
    }

    #[test]
    fn equal_expected_values_keep_input_order() {
        let rows = scorer().score(&[
            totals("A", 10.0, 5.0, 1, 2, 1),
            totals("B", 10.0, 5.0, 1, 2, 1),
            totals("C", 10.0, 9.0, 1, 2, 1),
        ]);
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["C", "A", "B"]);
    }

    #[test]
    fn overflowing_ev_scores_as_zero() {
        let rows = scorer().score(&[
            totals("huge", 1e308, f64::INFINITY, 2, 1, 2),
            totals("normal", 10.0, 4.0, 1, 2, 1),
        ]);
        let huge = rows.iter().find(|r| r.name == "huge").unwrap();
        assert_eq!(huge.ev_raw, 0.0);
        assert_eq!(huge.expected_value, 0.0);
        assert_eq!(rows[0].name, "normal");
        assert!(rows.iter().all(|r| r.value_score.is_finite() && r.expected_value.is_finite()));
    }

    #[test]
    fn flat_column_normalizes_to_zero() {
        assert_eq!(min_max_normalize(&[4.0, 4.0, 4.0]), vec![0.0, 0.0, 0.0]);
        assert_eq!(min_max_normalize(&[7.0]), vec![0.0]);
        assert!(min_max_normalize(&[]).is_empty());
    }

    #[test]
    fn min_max_spans_unit_interval() {
        assert_eq!(min_max_normalize(&[2.0, 6.0, 4.0]), vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn composite_weights_components() {
        let s = scorer();
        let rows = s.score(&[
            totals("best-ev", 10.0, 9.0, 10, 20, 0),
            totals("most-left", 10.0, 1.0, 110, 200, 4),
        ]);
        let scores = s.composite(&rows);
        assert_eq!(rows[0].name, "best-ev");
        assert_eq!(scores[0].value_norm, 1.0);
        assert_eq!(scores[0].prize_norm, 0.0);
        assert!((scores[0].score - 0.5).abs() < 1e-12);
        assert!((scores[1].score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn composite_on_flat_table_is_zero() {
        let s = scorer();
        let rows = s.score(&[totals("A", 10.0, 1.0, 1, 2, 1), totals("B", 10.0, 1.0, 1, 2, 1)]);
        assert!(s.composite(&rows).iter().all(|c| c.score == 0.0));
    }
}
