//! In-memory progress store for testing.

use super::{ProgressStore, RunProgress};
use crate::error::ProgressStoreError;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// In-memory progress store
///
/// Clones share the same slot, so a test can keep a handle while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProgressStore {
    slot: Arc<RwLock<Option<RunProgress>>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> ProgressStoreError {
        ProgressStoreError::Corrupted {
            path: PathBuf::from("memory"),
            reason: "lock poisoned".to_string(),
        }
    }
}

impl ProgressStore for InMemoryProgressStore {
    fn load(&self) -> Result<Option<RunProgress>, ProgressStoreError> {
        let slot = self.slot.read().map_err(|_| Self::poisoned())?;
        Ok(slot.clone())
    }

    fn save(&self, progress: &RunProgress) -> Result<(), ProgressStoreError> {
        let mut slot = self.slot.write().map_err(|_| Self::poisoned())?;
        *slot = Some(progress.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ProgressStoreError> {
        let mut slot = self.slot.write().map_err(|_| Self::poisoned())?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let store = InMemoryProgressStore::new();
        let handle = store.clone();

        let progress = RunProgress::new(vec![PathBuf::from("/src")], PathBuf::from("/dest"), 5);
        store.save(&progress).unwrap();

        assert_eq!(handle.load().unwrap(), Some(progress));
        handle.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
