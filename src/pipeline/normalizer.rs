//! Coerces raw dataset rows into typed prize tiers.
//!
//! Coercion never fails: unusable values become `0`, and rows that end up
//! without a positive prize or print run are dropped and counted.

use serde_json::Value;

use crate::types::{PrizeTier, RawPrizeRecord};

/// Why a raw record was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingName,
    NonPositivePrize,
    NonPositiveTotal,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NormalizeStats {
    pub input_rows: usize,
    pub kept: usize,
    pub rejected_missing_name: usize,
    pub rejected_prize: usize,
    pub rejected_total: usize,
}

impl NormalizeStats {
    pub fn rejected(&self) -> usize {
        self.rejected_missing_name + self.rejected_prize + self.rejected_total
    }
}

/// Parse a currency value. Strings keep only digits and `.` before parsing,
/// so `"$10,000"` reads as `10000.0`. Empty or unparsable input is `0`.
pub fn parse_currency(v: Option<&Value>) -> f64 {
    let parsed = match v {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let cleaned: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
            if cleaned.is_empty() {
                0.0
            } else {
                cleaned.parse::<f64>().unwrap_or(0.0)
            }
        }
        _ => 0.0,
    };
    if parsed.is_finite() { parsed } else { 0.0 }
}

/// Parse a count. Decimal input is truncated; negative, missing or
/// unparsable input is `0`.
pub fn parse_count(v: Option<&Value>) -> u64 {
    match v {
        Some(Value::Number(n)) => n.as_u64().unwrap_or_else(|| truncate_count(n.as_f64())),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .unwrap_or_else(|_| truncate_count(s.parse::<f64>().ok()))
        }
        _ => 0,
    }
}

fn truncate_count(v: Option<f64>) -> u64 {
    match v {
        Some(f) if f.is_finite() && f > 0.0 => f.trunc() as u64,
        _ => 0,
    }
}

/// Normalize one record, or report why it carries no usable information.
pub fn normalize(raw: &RawPrizeRecord) -> std::result::Result<PrizeTier, Rejection> {
    let name = match raw.game_name.as_deref() {
        Some(n) if !n.trim().is_empty() => n.to_string(),
        _ => return Err(Rejection::MissingName),
    };

    let prize_amount = parse_currency(raw.prize_amount.as_ref());
    if prize_amount <= 0.0 {
        return Err(Rejection::NonPositivePrize);
    }

    let total = parse_count(raw.total.as_ref());
    if total == 0 {
        return Err(Rejection::NonPositiveTotal);
    }

    Ok(PrizeTier {
        name,
        game_number: parse_count(raw.game_number.as_ref()),
        prize_amount,
        unpaid: parse_count(raw.unpaid.as_ref()),
        total,
    })
}

/// Normalize a whole dataset, keeping input order for the surviving tiers.
pub fn normalize_all(raw: &[RawPrizeRecord]) -> (Vec<PrizeTier>, NormalizeStats) {
    let mut stats = NormalizeStats { input_rows: raw.len(), ..Default::default() };
    let mut tiers = Vec::with_capacity(raw.len());

    for record in raw {
        match normalize(record) {
            Ok(tier) => tiers.push(tier),
            Err(Rejection::MissingName) => stats.rejected_missing_name += 1,
            Err(Rejection::NonPositivePrize) => stats.rejected_prize += 1,
            Err(Rejection::NonPositiveTotal) => stats.rejected_total += 1,
        }
    }

    stats.kept = tiers.len();
    (tiers, stats)
}
