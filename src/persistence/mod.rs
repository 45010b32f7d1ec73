//! Durable storage for the progression state
//!
//! The core only needs `load` and `save`; both are synchronous. A record that
//! cannot be read is discarded and the character starts over from defaults.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::core::error::Result;
use crate::progression::state::ProgressionState;

pub trait StateStore: Send {
    /// The stored state, or `None` if nothing has been saved yet
    fn load(&self) -> Result<Option<ProgressionState>>;

    fn save(&mut self, state: &ProgressionState) -> Result<()>;
}

/// Load the stored state, falling back to defaults on absence or corruption
pub fn load_or_default(store: &dyn StateStore) -> ProgressionState {
    match store.load() {
        Ok(Some(mut state)) => {
            state.normalize();
            tracing::info!(
                total_input_count = state.total_input_count,
                "Loaded saved progression"
            );
            state
        }
        Ok(None) => {
            tracing::info!("No saved progression, starting fresh");
            ProgressionState::default()
        }
        Err(e) => {
            tracing::warn!("Save data unreadable ({}), starting fresh", e);
            ProgressionState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_record_falls_back_to_defaults() {
        let store = MemoryStore::with_raw("{not json");
        let state = load_or_default(&store);
        assert_eq!(state, ProgressionState::default());
    }

    #[test]
    fn test_missing_record_gives_defaults() {
        let store = MemoryStore::new();
        assert_eq!(load_or_default(&store), ProgressionState::default());
    }

    #[test]
    fn test_loaded_record_is_normalized() {
        let store = MemoryStore::with_raw(r#"{"stats": {"STR": 0}, "totalInputCount": 3}"#);
        let state = load_or_default(&store);
        assert_eq!(state.stats.str, 1);
        assert_eq!(state.total_input_count, 3);
    }
}
