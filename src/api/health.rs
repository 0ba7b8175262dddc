//! Shared refresh status for the /health endpoint.
//! Written by the refresher, read by the API.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Default)]
pub struct HealthState {
    /// Unix seconds of the last successful recompute (0 = none yet).
    pub last_refresh_at: AtomicU64,
    pub refresh_count: AtomicU64,
    pub refresh_failures: AtomicU64,
    /// Outcome of the most recent recompute attempt.
    pub last_refresh_ok: AtomicBool,
    /// Games in the last successful recompute.
    pub last_game_count: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, at_secs: u64, games: usize) {
        self.last_refresh_at.store(at_secs, Ordering::Relaxed);
        self.last_game_count.store(games as u64, Ordering::Relaxed);
        self.refresh_count.fetch_add(1, Ordering::Relaxed);
        self.last_refresh_ok.store(true, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.refresh_failures.fetch_add(1, Ordering::Relaxed);
        self.last_refresh_ok.store(false, Ordering::Relaxed);
    }

    pub fn last_refresh_at(&self) -> u64 {
        self.last_refresh_at.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> HealthResponse {
        let attempts = self.refresh_count.load(Ordering::Relaxed)
            + self.refresh_failures.load(Ordering::Relaxed);
        HealthResponse {
            status: "ok".to_string(),
            last_refresh_at: match self.last_refresh_at() {
                0 => None,
                t => Some(t),
            },
            last_refresh_ok: (attempts > 0).then(|| self.last_refresh_ok.load(Ordering::Relaxed)),
            refresh_count: self.refresh_count.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            last_game_count: self.last_game_count.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub last_refresh_at: Option<u64>,
    /// None until the first recompute attempt in this process.
    pub last_refresh_ok: Option<bool>,
    pub refresh_count: u64,
    pub refresh_failures: u64,
    pub last_game_count: u64,
}
