//! In-memory store
//!
//! Keeps the serialized JSON record rather than the struct, so it exercises
//! the same encoding path as the file store.

use crate::core::error::Result;
use crate::persistence::StateStore;
use crate::progression::state::ProgressionState;

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    record: Option<String>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a raw stored record (possibly corrupt)
    pub fn with_raw(record: impl Into<String>) -> Self {
        Self {
            record: Some(record.into()),
            saves: 0,
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.record.as_deref()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<ProgressionState>> {
        match &self.record {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, state: &ProgressionState) -> Result<()> {
        self.record = Some(serde_json::to_string(state)?);
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut state = ProgressionState::new();
        state.total_input_count = 4;
        state.traits.push("ねばりづよい".into());

        store.save(&state).unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load().unwrap(), Some(state));
    }
}
