//! AttributeStore - the only way to mutate the progression state
//!
//! Every mutation is written through to the backing store before the call
//! returns.

use chrono::{DateTime, Utc};

use crate::battle::transcript::BattleResult;
use crate::core::error::Result;
use crate::core::types::StatDeltas;
use crate::persistence::{load_or_default, StateStore};
use crate::progression::analysis::AnalysisResult;
use crate::progression::state::{ChangeRecord, ProgressionState};

pub struct AttributeStore {
    state: ProgressionState,
    backend: Box<dyn StateStore>,
}

impl AttributeStore {
    /// Rehydrate from the backend, or start from defaults
    pub fn open(backend: Box<dyn StateStore>) -> Self {
        let state = load_or_default(backend.as_ref());
        Self { state, backend }
    }

    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    /// Apply a group of mutations as one unit
    ///
    /// The record is saved once after `apply` runs. If that save fails the
    /// in-memory state is rolled back, so it never holds a change the backend
    /// does not.
    pub fn transact<T>(&mut self, apply: impl FnOnce(&mut ProgressionState) -> T) -> Result<T> {
        let before = self.state.clone();
        let value = apply(&mut self.state);
        if let Err(e) = self.persist() {
            self.state = before;
            return Err(e);
        }
        Ok(value)
    }

    pub fn apply_stat_changes(&mut self, deltas: &StatDeltas) -> Result<()> {
        let applied = self.transact(|state| state.apply_stat_changes(deltas))?;
        if applied < deltas.len() {
            tracing::debug!(
                ignored = deltas.len() - applied,
                "Ignored unknown attribute codes"
            );
        }
        Ok(())
    }

    pub fn add_traits(&mut self, candidates: &[String]) -> Result<Vec<String>> {
        self.transact(|state| state.add_traits(candidates))
    }

    pub fn set_epithet(&mut self, value: &str) -> Result<()> {
        if value.is_empty() {
            return Ok(());
        }
        self.transact(|state| {
            state.set_epithet(value);
        })
    }

    pub fn add_entry(
        &mut self,
        text: &str,
        response: AnalysisResult,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.transact(|state| state.add_entry(text, response, at))
    }

    pub fn add_change_record(&mut self, record: ChangeRecord) -> Result<()> {
        self.transact(|state| state.add_change_record(record))
    }

    pub fn add_battle_record(&mut self, record: BattleResult) -> Result<()> {
        self.transact(|state| state.add_battle_record(record))
    }

    pub fn set_image(&mut self, payload: String) -> Result<()> {
        self.transact(|state| state.set_image(payload))
    }

    /// Discard everything and start over from defaults
    pub fn reset(&mut self) -> Result<()> {
        self.transact(|state| *state = ProgressionState::default())?;
        tracing::info!("Progression reset");
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        self.backend.save(&self.state).map_err(|e| {
            tracing::warn!("Failed to persist progression: {}", e);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AotaError;
    use crate::persistence::{JsonFileStore, MemoryStore, StateStore};
    use chrono::TimeZone;

    /// Loads nothing and refuses every save
    struct ReadOnlyStore;

    impl StateStore for ReadOnlyStore {
        fn load(&self) -> Result<Option<ProgressionState>> {
            Ok(None)
        }

        fn save(&mut self, _state: &ProgressionState) -> Result<()> {
            Err(AotaError::StorageError("read-only".into()))
        }
    }

    #[test]
    fn test_mutations_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");

        let mut store = AttributeStore::open(Box::new(JsonFileStore::new(&path)));
        let deltas: StatDeltas = [("WIS".to_string(), 4)].into_iter().collect();
        store.apply_stat_changes(&deltas).unwrap();
        store.add_traits(&["しんちょう".to_string()]).unwrap();
        store.set_epithet("かんがえるひと").unwrap();

        let reopened = AttributeStore::open(Box::new(JsonFileStore::new(&path)));
        assert_eq!(reopened.state().stats.wis, 34);
        assert_eq!(reopened.state().traits, vec!["しんちょう"]);
        assert_eq!(reopened.state().epithet, "かんがえるひと");
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut store = AttributeStore::open(Box::new(MemoryStore::new()));
        let at = Utc.with_ymd_and_hms(2025, 3, 6, 12, 0, 0).unwrap();
        store.add_entry("hi", AnalysisResult::default(), at).unwrap();
        store.set_image("aGVsbG8=".into()).unwrap();

        store.reset().unwrap();
        assert_eq!(store.state(), &ProgressionState::default());
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let mut store = AttributeStore::open(Box::new(ReadOnlyStore));
        let deltas: StatDeltas = [("CHA".to_string(), 5)].into_iter().collect();

        let result = store.transact(|state| {
            state.apply_stat_changes(&deltas);
            state.add_traits(&["x".to_string()]);
        });
        assert!(matches!(result, Err(AotaError::StorageError(_))));
        assert_eq!(store.state(), &ProgressionState::default());

        assert!(store.set_epithet("ゆうしゃ").is_err());
        assert!(store.state().epithet.is_empty());
    }
}
