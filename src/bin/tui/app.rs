use crossterm::event::KeyCode;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use scratch_ranker::api::HealthResponse;
use scratch_ranker::types::{GameSummary, Movers, Recommendation};

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Error(String),
    Connecting,
}

/// Which ranking the left-hand table shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingView {
    RemainingPrizes,
    GrandPrizes,
}

impl RankingView {
    pub fn toggle(self) -> Self {
        match self {
            RankingView::RemainingPrizes => RankingView::GrandPrizes,
            RankingView::GrandPrizes => RankingView::RemainingPrizes,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RankingView::RemainingPrizes => " TOP BY PRIZES REMAINING ",
            RankingView::GrandPrizes => " TOP BY GRAND PRIZES LEFT ",
        }
    }
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Refresh,
    Continue,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub status: ConnectionStatus,
    pub recommendation: Option<Recommendation>,
    pub best_any: Vec<GameSummary>,
    pub best_grand: Vec<GameSummary>,
    /// None while the server reports fewer than two snapshots.
    pub movers: Option<Movers>,
    pub health: HealthResponse,
    pub view: RankingView,
    /// Highlighted row of the games table.
    pub selected: Option<usize>,
    pub last_refresh: std::time::Instant,
    pub base_url: String,
}

/// A successful body, or None when the server answered with a 4xx
/// "no data" / "not enough data" result.
type Fetched<T> = Result<Option<T>, String>;

async fn get_json<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Fetched<T> {
    let resp = client.get(url).send().await.map_err(|e| e.to_string())?;
    match resp.status() {
        s if s.is_success() => resp.json::<T>().await.map(Some).map_err(|e| format!("parse error: {e}")),
        StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Ok(None),
        s => Err(format!("HTTP {s}")),
    }
}

impl AppState {
    pub fn new(base_url: String) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            recommendation: None,
            best_any: Vec::new(),
            best_grand: Vec::new(),
            movers: None,
            health: HealthResponse::default(),
            view: RankingView::RemainingPrizes,
            selected: None,
            last_refresh: std::time::Instant::now(),
            base_url,
        }
    }

    pub fn displayed_games(&self) -> &[GameSummary] {
        match self.view {
            RankingView::RemainingPrizes => &self.best_any,
            RankingView::GrandPrizes => &self.best_grand,
        }
    }

    pub fn on_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Char('q' | 'Q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char('r' | 'R') => return Action::Refresh,
            KeyCode::Tab => {
                self.view = self.view.toggle();
                self.selected = None;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let last = self.displayed_games().len().saturating_sub(1);
                self.selected = Some(self.selected.map_or(0, |i| (i + 1).min(last)));
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = Some(self.selected.map_or(0, |i| i.saturating_sub(1)));
            }
            _ => {}
        }
        Action::Continue
    }

    pub async fn refresh(&mut self, client: &reqwest::Client) {
        let rec_url = format!("{}/api/recommendation", self.base_url);
        let any_url = format!("{}/api/best_any", self.base_url);
        let grand_url = format!("{}/api/best_grand", self.base_url);
        let movers_url = format!("{}/api/movers", self.base_url);
        let health_url = format!("{}/health", self.base_url);

        let (rec, any, grand, movers, health) = tokio::join!(
            get_json::<Recommendation>(client, &rec_url),
            get_json::<Vec<GameSummary>>(client, &any_url),
            get_json::<Vec<GameSummary>>(client, &grand_url),
            get_json::<Movers>(client, &movers_url),
            get_json::<HealthResponse>(client, &health_url),
        );

        match (rec, any, grand) {
            (Ok(rec), Ok(any), Ok(grand)) => {
                self.recommendation = rec;
                self.best_any = any.unwrap_or_default();
                self.best_grand = grand.unwrap_or_default();
                self.status = ConnectionStatus::Connected;
                self.last_refresh = std::time::Instant::now();

                if let Ok(m) = movers {
                    self.movers = m;
                }
                if let Ok(Some(h)) = health {
                    self.health = h;
                }
            }
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                self.status = ConnectionStatus::Error(e);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Whole-dollar amount with thousands separators: `$1,000,000`.
pub fn format_currency(v: f64) -> String {
    let whole = v.max(0.0).round() as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("${out}")
}

pub fn format_change(v: f64) -> String {
    if v >= 0.0 {
        format!("+{v:.4}")
    } else {
        format!("{v:.4}")
    }
}

/// Unix seconds to `HH:MM:SS` UTC.
pub fn format_time_secs(secs: Option<u64>) -> String {
    secs.and_then(|s| chrono::DateTime::from_timestamp(s as i64, 0))
        .map_or("—".to_string(), |t| t.format("%H:%M:%S").to_string())
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
