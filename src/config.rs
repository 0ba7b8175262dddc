use crate::error::{AppError, Result};

/// New York State Open Data: scratch-off prizes remaining, one row per prize tier.
pub const DATA_URL: &str = "https://data.ny.gov/resource/nzqa-7unk.json";

pub const DATA_PATH: &str = "ny_scratch_data.json";
pub const HISTORY_PATH: &str = "ny_scratch_history.json";

/// Upstream fetch timeout (seconds).
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Row limit passed to the Socrata endpoint. The default page of 1000 rows
/// truncates the dataset.
pub const FETCH_ROW_LIMIT: usize = 50_000;

/// Default size of the top-N ranking views.
pub const TOP_N: usize = 10;

/// Default number of gainers and of losers in the movers view.
pub const MOVERS_LIMIT: usize = 5;

/// Ticket price estimate by top prize, highest threshold first.
/// `(minimum top prize, estimated ticket price)`; first match wins.
pub mod price_tiers {
    pub const DEFAULT: &[(f64, f64)] = &[
        (20_000_000.0, 50.0),
        (10_000_000.0, 30.0),
        (5_000_000.0, 20.0),
        (2_000_000.0, 10.0),
        (500_000.0, 5.0),
        (20_000.0, 2.0),
    ];

    /// Price when no threshold matches.
    pub const FLOOR: f64 = 1.0;
}

/// Composite ranking weights.
pub mod composite_weights {
    pub const EXPECTED_VALUE: f64 = 0.5;
    pub const REMAINING_PRIZES: f64 = 0.3;
    pub const GRAND_PRIZES: f64 = 0.2;
}

/// Tunable scoring constants. The defaults reproduce the published formulas;
/// the weights can be overridden from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    /// `(minimum top prize, ticket price)`, sorted highest threshold first.
    pub price_tiers: Vec<(f64, f64)>,
    pub price_floor: f64,
    pub weight_expected_value: f64,
    pub weight_remaining: f64,
    pub weight_grand: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            price_tiers: price_tiers::DEFAULT.to_vec(),
            price_floor: price_tiers::FLOOR,
            weight_expected_value: composite_weights::EXPECTED_VALUE,
            weight_remaining: composite_weights::REMAINING_PRIZES,
            weight_grand: composite_weights::GRAND_PRIZES,
        }
    }
}

impl ScoringPolicy {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            weight_expected_value: env_f64("SCORE_WEIGHT_EV", defaults.weight_expected_value),
            weight_remaining: env_f64("SCORE_WEIGHT_REMAINING", defaults.weight_remaining),
            weight_grand: env_f64("SCORE_WEIGHT_GRAND", defaults.weight_grand),
            ..defaults
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_url: String,
    pub data_path: String,
    pub history_path: String,
    pub log_level: String,
    pub api_port: u16,
    pub fetch_timeout_secs: u64,
    /// Seconds between background recomputes (REFRESH_INTERVAL_SECS). 0 disables the refresher.
    pub refresh_interval_secs: u64,
    /// Run one recompute before the API starts serving (REFRESH_ON_START).
    pub refresh_on_start: bool,
    pub top_n: usize,
    pub movers_limit: usize,
    pub policy: ScoringPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            data_url: std::env::var("DATA_URL").unwrap_or_else(|_| DATA_URL.to_string()),
            data_path: std::env::var("DATA_PATH").unwrap_or_else(|_| DATA_PATH.to_string()),
            history_path: std::env::var("HISTORY_PATH")
                .unwrap_or_else(|_| HISTORY_PATH.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .or_else(|_| std::env::var("PORT"))
                .unwrap_or_else(|_| "5000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            fetch_timeout_secs: std::env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| FETCH_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .unwrap_or(FETCH_TIMEOUT_SECS),
            refresh_interval_secs: std::env::var("REFRESH_INTERVAL_SECS")
                .unwrap_or_else(|_| "0".to_string())
                .parse::<u64>()
                .map_err(|_| {
                    AppError::Config("REFRESH_INTERVAL_SECS must be a whole number of seconds".to_string())
                })?,
            refresh_on_start: std::env::var("REFRESH_ON_START")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            top_n: std::env::var("TOP_N")
                .unwrap_or_else(|_| TOP_N.to_string())
                .parse::<usize>()
                .unwrap_or(TOP_N),
            movers_limit: std::env::var("MOVERS_LIMIT")
                .unwrap_or_else(|_| MOVERS_LIMIT.to_string())
                .parse::<usize>()
                .unwrap_or(MOVERS_LIMIT),
            policy: ScoringPolicy::from_env(),
        })
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}
