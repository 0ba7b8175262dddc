use std::sync::{Arc, PoisonError, RwLock};

use crate::error::Result;
use crate::store::{ensure_finite, SnapshotStore};
use crate::types::{GameSummary, History, Snapshot};

/// Process-local store. Each artifact sits behind its own lock, so readers
/// always see a whole table or a whole history. Writes replace or push in one
/// step, so a poisoned lock still guards consistent data and is recovered.
#[derive(Default)]
pub struct MemoryStore {
    current: RwLock<Vec<GameSummary>>,
    history: RwLock<History>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_data(current: Vec<GameSummary>, history: History) -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(current),
            history: RwLock::new(history),
        })
    }
}

impl SnapshotStore for MemoryStore {
    fn load_current(&self) -> Result<Vec<GameSummary>> {
        Ok(self.current.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save_current(&self, table: &[GameSummary]) -> Result<()> {
        ensure_finite(table)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = table.to_vec();
        Ok(())
    }

    fn load_history(&self) -> Result<History> {
        Ok(self.history.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn append_history(&self, snapshot: Snapshot) -> Result<()> {
        ensure_finite(&snapshot.data)?;
        self.history.write().unwrap_or_else(PoisonError::into_inner).push(snapshot);
        Ok(())
    }
}
