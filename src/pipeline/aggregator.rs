use std::collections::HashMap;

use crate::types::PrizeTier;

/// Per-game totals folded from that game's prize tiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameTotals {
    pub name: String,
    pub game_number: u64,
    pub remaining_prizes: u64,
    pub total_prizes: u64,
    pub top_prize: f64,
    /// Σ prize_amount × unpaid / total, evaluated per tier.
    pub ev_raw: f64,
    /// Σ unpaid over tiers whose prize equals `top_prize`.
    pub grand_prizes_remaining: u64,
}

impl GameTotals {
    fn new(name: String) -> Self {
        Self { name, ..Default::default() }
    }
}

/// Folds tiers into one game's totals. EV terms are held back and summed in
/// sorted order, so `ev_raw` is bit-identical for any tier order.
struct Accumulator {
    totals: GameTotals,
    ev_terms: Vec<f64>,
}

impl Accumulator {
    fn new(name: String) -> Self {
        Self { totals: GameTotals::new(name), ev_terms: Vec::new() }
    }

    fn fold(&mut self, tier: &PrizeTier) {
        let t = &mut self.totals;
        t.remaining_prizes = t.remaining_prizes.saturating_add(tier.unpaid);
        t.total_prizes = t.total_prizes.saturating_add(tier.total);
        t.game_number = t.game_number.max(tier.game_number);

        if tier.total > 0 {
            self.ev_terms.push(tier.prize_amount * (tier.unpaid as f64 / tier.total as f64));
        }

        // A new maximum restarts the grand-prize count.
        if tier.prize_amount > t.top_prize {
            t.top_prize = tier.prize_amount;
            t.grand_prizes_remaining = tier.unpaid;
        } else if tier.prize_amount == t.top_prize {
            t.grand_prizes_remaining = t.grand_prizes_remaining.saturating_add(tier.unpaid);
        }
    }

    fn finish(mut self) -> GameTotals {
        self.ev_terms.sort_by(f64::total_cmp);
        self.totals.ev_raw = self.ev_terms.iter().sum();
        self.totals
    }
}

/// Group tiers by exact game name in a single pass. Output is sorted by name,
/// so it does not depend on input order.
pub fn aggregate(tiers: &[PrizeTier]) -> Vec<GameTotals> {
    let mut groups: HashMap<&str, Accumulator> = HashMap::new();

    for tier in tiers {
        groups
            .entry(tier.name.as_str())
            .or_insert_with(|| Accumulator::new(tier.name.clone()))
            .fold(tier);
    }

    let mut out: Vec<GameTotals> = groups.into_values().map(Accumulator::finish).collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}
