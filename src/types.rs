use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Raw dataset rows
// ---------------------------------------------------------------------------

/// One prize tier of one game as delivered by the upstream dataset.
/// Numeric fields arrive as JSON strings (`"$10,000"`, `"12"`) or numbers and
/// may be missing entirely, so they are kept as raw JSON until normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPrizeRecord {
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub game_number: Option<serde_json::Value>,
    #[serde(default)]
    pub prize_amount: Option<serde_json::Value>,
    #[serde(default)]
    pub unpaid: Option<serde_json::Value>,
    #[serde(default)]
    pub total: Option<serde_json::Value>,
}

/// A raw record after numeric coercion and the positivity filter.
#[derive(Debug, Clone, PartialEq)]
pub struct PrizeTier {
    pub name: String,
    pub game_number: u64,
    pub prize_amount: f64,
    pub unpaid: u64,
    pub total: u64,
}

// ---------------------------------------------------------------------------
// Scored output
// ---------------------------------------------------------------------------

/// One row per game. Produced by the scorer, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub name: String,
    #[serde(default)]
    pub game_number: u64,
    pub top_prize: f64,
    pub ticket_price_est: f64,
    pub ev_raw: f64,
    /// Same value as `ev_per_dollar`; kept under both names for consumers.
    pub expected_value: f64,
    pub ev_per_dollar: f64,
    pub remaining_prizes: u64,
    pub total_prizes: u64,
    pub remaining_ratio: f64,
    pub grand_prizes_remaining: u64,
    pub value_score: f64,
}

impl GameSummary {
    /// Name of the first float field that is NaN or infinite.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        [
            ("top_prize", self.top_prize),
            ("ticket_price_est", self.ticket_price_est),
            ("ev_raw", self.ev_raw),
            ("expected_value", self.expected_value),
            ("ev_per_dollar", self.ev_per_dollar),
            ("remaining_ratio", self.remaining_ratio),
            ("value_score", self.value_score),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(field, _)| field)
    }
}

/// Best-single-game view: the summary row plus the normalized components of
/// the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub game: GameSummary,
    pub value_norm: f64,
    pub prize_norm: f64,
    pub grand_norm: f64,
    pub smart_score: f64,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// One timestamped, complete computation of all game summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// ISO-8601, seconds precision.
    pub timestamp: String,
    pub data: Vec<GameSummary>,
}

/// Oldest first. Only ever appended to.
pub type History = Vec<Snapshot>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub name: String,
    pub expected_value_now: f64,
    pub expected_value_prev: f64,
    pub change: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movers {
    pub gainers: Vec<Mover>,
    pub losers: Vec<Mover>,
}

// ---------------------------------------------------------------------------
// Ranking keys
// ---------------------------------------------------------------------------

/// Columns a summary table can be ranked by. `Composite` is computed over the
/// whole table, so it is handled by the ranker rather than read off a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankKey {
    Composite,
    ExpectedValue,
    ValueScore,
    RemainingPrizes,
    GrandPrizesRemaining,
    TopPrize,
}

impl RankKey {
    /// Per-row value for every key except `Composite`, which returns None.
    pub fn row_value(self, game: &GameSummary) -> Option<f64> {
        match self {
            RankKey::Composite => None,
            RankKey::ExpectedValue => Some(game.expected_value),
            RankKey::ValueScore => Some(game.value_score),
            RankKey::RemainingPrizes => Some(game.remaining_prizes as f64),
            RankKey::GrandPrizesRemaining => Some(game.grand_prizes_remaining as f64),
            RankKey::TopPrize => Some(game.top_prize),
        }
    }
}

impl std::fmt::Display for RankKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RankKey::Composite => "composite",
            RankKey::ExpectedValue => "expected_value",
            RankKey::ValueScore => "value_score",
            RankKey::RemainingPrizes => "remaining_prizes",
            RankKey::GrandPrizesRemaining => "grand_prizes_remaining",
            RankKey::TopPrize => "top_prize",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_record_accepts_strings_numbers_and_missing_fields() {
        let json = r#"[
            {"game_name":"Lucky 7s","game_number":"1523","prize_amount":"$10,000","unpaid":"3","total":"12"},
            {"game_name":"Cash Blast","prize_amount":500,"unpaid":2,"total":20},
            {"game_name":"Partial"}
        ]"#;
        let rows: Vec<RawPrizeRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].game_name.as_deref(), Some("Lucky 7s"));
        assert!(rows[1].game_number.is_none());
        assert!(rows[2].prize_amount.is_none());
    }

    #[test]
    fn recommendation_flattens_summary_fields() {
        let rec = Recommendation {
            game: GameSummary {
                name: "A".to_string(),
                game_number: 1,
                top_prize: 500.0,
                ticket_price_est: 1.0,
                ev_raw: 60.0,
                expected_value: 60.0,
                ev_per_dollar: 60.0,
                remaining_prizes: 3,
                total_prizes: 30,
                remaining_ratio: 0.1,
                grand_prizes_remaining: 2,
                value_score: 1.0,
            },
            value_norm: 1.0,
            prize_norm: 0.0,
            grand_norm: 0.0,
            smart_score: 0.5,
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["name"], "A");
        assert_eq!(v["remaining_prizes"], 3);
        assert_eq!(v["smart_score"], 0.5);
    }

    #[test]
    fn composite_key_has_no_row_value() {
        let game = GameSummary {
            name: "A".to_string(),
            game_number: 0,
            top_prize: 10.0,
            ticket_price_est: 1.0,
            ev_raw: 0.0,
            expected_value: 0.0,
            ev_per_dollar: 0.0,
            remaining_prizes: 4,
            total_prizes: 8,
            remaining_ratio: 0.5,
            grand_prizes_remaining: 1,
            value_score: 0.0,
        };
        assert_eq!(RankKey::Composite.row_value(&game), None);
        assert_eq!(RankKey::RemainingPrizes.row_value(&game), Some(4.0));
    }
}
