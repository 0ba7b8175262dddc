//! Persisted state at the process boundary: the latest computed table and the
//! append-only snapshot history.
//!
//! Contract: every call reads or writes a whole artifact. A reader running
//! alongside a write sees either the previous or the new content. One writer
//! at a time is assumed.

pub mod json_store;
pub mod memory_store;

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::types::{GameSummary, History, Snapshot};

pub use json_store::JsonFileStore;
pub use memory_store::MemoryStore;

pub trait SnapshotStore: Send + Sync {
    /// Latest computed table. A missing store is an empty table.
    fn load_current(&self) -> Result<Vec<GameSummary>>;

    /// Replace the latest table as a whole.
    fn save_current(&self, table: &[GameSummary]) -> Result<()>;

    /// All snapshots, oldest first. Missing or unreadable history is empty.
    fn load_history(&self) -> Result<History>;

    /// Append one snapshot. Existing entries are never rewritten or reordered.
    fn append_history(&self, snapshot: Snapshot) -> Result<()>;
}

/// Reject tables JSON cannot represent faithfully.
pub fn ensure_finite(table: &[GameSummary]) -> Result<()> {
    match table.iter().find_map(|g| g.non_finite_field().map(|f| (g, f))) {
        Some((g, field)) => Err(AppError::NonFinite(format!("{field} for game {:?}", g.name))),
        None => Ok(()),
    }
}

/// Run a store call on the blocking pool. Stores do whole-file I/O.
pub async fn blocking<T, F>(store: &Arc<dyn SnapshotStore>, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn SnapshotStore) -> Result<T> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || f(store.as_ref())).await?
}
