//! Exhibit - the application root
//!
//! Owns the progression state (through `AttributeStore`), the configuration,
//! the battle RNG, and the two single-flight guards. Every operation the
//! outside world can perform on the character goes through here.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::battle::scheduler::BattleScheduler;
use crate::battle::simulator::{battle_reward, resolve_battle};
use crate::battle::transcript::BattleResult;
use crate::core::calendar::exhibition_day;
use crate::core::config::ExhibitConfig;
use crate::core::error::{Rejection, Result};
use crate::core::flight::{FlightPermit, SingleFlight};
use crate::core::types::Stats;
use crate::persistence::StateStore;
use crate::progression::analysis::AnalysisResult;
use crate::progression::job::Job;
use crate::progression::stage::{EvolutionProgress, Stage};
use crate::progression::state::{ChangeRecord, ProgressionState};
use crate::progression::store::AttributeStore;

/// A validated submission waiting for its analysis
///
/// Holds the submission guard. Dropping it without completing (analysis
/// failed) releases the guard and leaves the state untouched.
#[derive(Debug)]
pub struct PendingSubmission {
    text: String,
    _permit: FlightPermit,
}

impl PendingSubmission {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// What an accepted submission did
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub stage_before: Stage,
    pub stage_after: Stage,
    pub traits_added: Vec<String>,
    /// Sum of the requested deltas (sign picks the rising/falling cue)
    pub net_change: i64,
    pub narrative: String,
    /// Whether a new portrait should be requested now
    pub wants_image: bool,
    pub image_prompt_hint: String,
}

impl SubmissionOutcome {
    pub fn evolved(&self) -> bool {
        self.stage_after > self.stage_before
    }
}

/// Everything the presentation layer needs to draw the character
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub total_input_count: u32,
    /// 0 before the exhibition opens
    pub exhibition_day: u32,
    pub epithet: String,
    pub stage: Stage,
    pub job: Job,
    pub stats: Stats,
    pub traits: Vec<String>,
    pub evolution: EvolutionProgress,
    pub has_image: bool,
}

impl Snapshot {
    pub fn day_label(&self) -> String {
        if self.exhibition_day > 0 {
            format!("DAY{}", self.exhibition_day)
        } else {
            "STANDBY".to_string()
        }
    }
}

/// Image cadence: first input, every `interval` inputs, or whenever none exists
pub fn should_generate_image(has_image: bool, total_input_count: u32, interval: u32) -> bool {
    !has_image || total_input_count == 1 || (interval > 0 && total_input_count % interval == 0)
}

pub struct Exhibit {
    config: ExhibitConfig,
    store: AttributeStore,
    rng: ChaCha8Rng,
    submissions: SingleFlight,
    battles: SingleFlight,
}

impl Exhibit {
    pub fn open(config: ExhibitConfig, backend: Box<dyn StateStore>) -> Self {
        Self::with_rng(config, backend, ChaCha8Rng::from_entropy())
    }

    pub fn with_seed(config: ExhibitConfig, backend: Box<dyn StateStore>, seed: u64) -> Self {
        Self::with_rng(config, backend, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn with_rng(config: ExhibitConfig, backend: Box<dyn StateStore>, rng: ChaCha8Rng) -> Self {
        Self {
            config,
            store: AttributeStore::open(backend),
            rng,
            submissions: SingleFlight::new(),
            battles: SingleFlight::new(),
        }
    }

    pub fn config(&self) -> &ExhibitConfig {
        &self.config
    }

    pub fn state(&self) -> &ProgressionState {
        self.store.state()
    }

    pub fn store_mut(&mut self) -> &mut AttributeStore {
        &mut self.store
    }

    pub fn is_processing(&self) -> bool {
        self.submissions.is_busy()
    }

    pub fn battle_in_progress(&self) -> bool {
        self.battles.is_busy()
    }

    /// Scheduler armed for the current state as of `now`, on local time
    pub fn scheduler(&self, now: DateTime<Utc>) -> BattleScheduler {
        let state = self.state();
        BattleScheduler::from_config(
            &self.config,
            now,
            state.total_input_count,
            state.last_battle_time,
        )
    }

    pub fn scheduler_with_offset(&self, now: DateTime<Utc>, offset: FixedOffset) -> BattleScheduler {
        let state = self.state();
        BattleScheduler::with_offset(
            &self.config,
            now,
            offset,
            state.total_input_count,
            state.last_battle_time,
        )
    }

    /// Trim and length-check an impression
    pub fn validate_text(&self, text: &str) -> std::result::Result<String, Rejection> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Rejection::Empty);
        }
        let len = text.chars().count();
        let max = self.config.max_input_length;
        if len > max {
            return Err(Rejection::TooLong { len, max });
        }
        Ok(text.to_string())
    }

    /// Validate an impression and take the submission guard
    pub fn begin_submission(&self, text: &str) -> Result<PendingSubmission> {
        let text = self.validate_text(text).map_err(|rejection| {
            tracing::info!(%rejection, "Submission rejected");
            rejection
        })?;

        let permit = self.submissions.try_acquire().ok_or_else(|| {
            tracing::info!("Submission rejected while another is in flight");
            Rejection::Busy
        })?;

        Ok(PendingSubmission {
            text,
            _permit: permit,
        })
    }

    /// Apply the analysis of a pending submission
    pub fn complete_submission(
        &mut self,
        pending: PendingSubmission,
        analysis: AnalysisResult,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome> {
        let stage_before = self.state().stage();

        let record = ChangeRecord {
            input: pending.text.clone(),
            stat_changes: analysis.stat_changes.clone(),
            new_traits: analysis.new_traits.clone(),
            narrative: analysis.narrative.clone(),
            timestamp: now,
        };
        // One save for the whole submission; a failed save leaves the state as it was
        let traits_added = self.store.transact(|state| {
            state.apply_stat_changes(&analysis.stat_changes);
            let added = state.add_traits(&analysis.new_traits);
            state.set_epithet(&analysis.epithet);
            state.add_entry(&pending.text, analysis.clone(), now);
            state.add_change_record(record);
            added
        })?;

        let state = self.state();
        let stage_after = state.stage();
        let wants_image = should_generate_image(
            state.image_b64.is_some(),
            state.total_input_count,
            self.config.image_generation_interval,
        );

        tracing::info!(
            total_input_count = state.total_input_count,
            changes = %analysis.change_summary(),
            "Submission accepted"
        );
        if stage_after > stage_before {
            tracing::info!(
                from = stage_before.name(),
                to = stage_after.name(),
                "Character evolved"
            );
        }

        Ok(SubmissionOutcome {
            stage_before,
            stage_after,
            traits_added,
            net_change: analysis.net_change(),
            narrative: analysis.narrative,
            wants_image,
            image_prompt_hint: analysis.image_prompt_hint,
        })
    }

    /// Submit an impression whose analysis is already at hand
    pub fn submit(
        &mut self,
        text: &str,
        analysis: AnalysisResult,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome> {
        let pending = self.begin_submission(text)?;
        self.complete_submission(pending, analysis, now)
    }

    /// Run one battle if allowed
    ///
    /// Returns `Ok(None)` without touching anything when there have been no
    /// inputs yet or another battle holds the guard.
    pub fn trigger_battle(&mut self, now: DateTime<Utc>) -> Result<Option<BattleResult>> {
        if self.state().total_input_count == 0 {
            tracing::debug!("Battle skipped: no inputs yet");
            return Ok(None);
        }
        let Some(_permit) = self.battles.try_acquire() else {
            tracing::debug!("Battle skipped: another battle is running");
            return Ok(None);
        };

        let result = resolve_battle(self.store.state(), &mut self.rng, now);
        tracing::info!(
            adversary = %result.adversary,
            won = result.won,
            rounds = result.rounds,
            "Battle resolved"
        );

        let reward = battle_reward(result.won);
        self.store.transact(|state| {
            state.apply_stat_changes(&reward);
            state.add_battle_record(result.clone());
        })?;
        Ok(Some(result))
    }

    pub fn set_image(&mut self, payload: String) -> Result<()> {
        self.store.set_image(payload)
    }

    pub fn reset(&mut self) -> Result<()> {
        self.store.reset()
    }

    pub fn snapshot(&self, today: NaiveDate) -> Snapshot {
        let state = self.state();
        Snapshot {
            total_input_count: state.total_input_count,
            exhibition_day: exhibition_day(
                today,
                self.config.exhibition_start,
                self.config.exhibition_end,
            ),
            epithet: state.epithet.clone(),
            stage: state.stage(),
            job: state.job(),
            stats: state.stats,
            traits: state.traits.clone(),
            evolution: state.evolution(),
            has_image: state.image_b64.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AotaError;
    use crate::persistence::MemoryStore;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Store whose saves fail while `failing` is set
    struct FlakyStore {
        failing: Arc<AtomicBool>,
    }

    impl StateStore for FlakyStore {
        fn load(&self) -> Result<Option<ProgressionState>> {
            Ok(None)
        }

        fn save(&mut self, _state: &ProgressionState) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                Err(AotaError::StorageError("disk full".into()))
            } else {
                Ok(())
            }
        }
    }

    fn flaky_exhibit() -> (Exhibit, Arc<AtomicBool>) {
        let failing = Arc::new(AtomicBool::new(false));
        let store = FlakyStore {
            failing: Arc::clone(&failing),
        };
        let exhibit = Exhibit::with_seed(ExhibitConfig::default(), Box::new(store), 42);
        (exhibit, failing)
    }

    fn exhibit() -> Exhibit {
        Exhibit::with_seed(ExhibitConfig::default(), Box::new(MemoryStore::new()), 42)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 6, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_empty_and_long_text_rejected() {
        let mut exhibit = exhibit();

        let result = exhibit.submit("   ", AnalysisResult::default(), now());
        assert!(matches!(result, Err(AotaError::Rejected(Rejection::Empty))));

        let long = "あ".repeat(61);
        let result = exhibit.submit(&long, AnalysisResult::default(), now());
        assert!(matches!(
            result,
            Err(AotaError::Rejected(Rejection::TooLong { len: 61, max: 60 }))
        ));

        assert_eq!(exhibit.state().total_input_count, 0);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let exhibit = exhibit();
        let text = "あ".repeat(60);
        assert_eq!(exhibit.validate_text(&text), Ok(text.clone()));
    }

    #[test]
    fn test_second_submission_busy_while_first_pending() {
        let mut exhibit = exhibit();
        let first = exhibit.begin_submission("one").unwrap();
        assert!(exhibit.is_processing());

        let second = exhibit.begin_submission("two");
        assert!(matches!(second, Err(AotaError::Rejected(Rejection::Busy))));

        exhibit
            .complete_submission(first, AnalysisResult::default(), now())
            .unwrap();
        assert!(!exhibit.is_processing());
        assert_eq!(exhibit.state().total_input_count, 1);
    }

    #[test]
    fn test_dropped_submission_releases_guard_without_counting() {
        let exhibit = exhibit();
        let pending = exhibit.begin_submission("hello").unwrap();
        drop(pending);
        assert!(!exhibit.is_processing());
        assert_eq!(exhibit.state().total_input_count, 0);
        assert!(exhibit.begin_submission("again").is_ok());
    }

    #[test]
    fn test_no_battle_before_first_input() {
        let mut exhibit = exhibit();
        assert!(exhibit.trigger_battle(now()).unwrap().is_none());
        assert!(exhibit.state().battle_history.is_empty());
        assert!(exhibit.state().last_battle_time.is_none());
    }

    #[test]
    fn test_battle_applies_reward_and_records() {
        let mut exhibit = exhibit();
        exhibit.submit("hello", AnalysisResult::default(), now()).unwrap();
        let before = exhibit.state().stats;

        let result = exhibit.trigger_battle(now()).unwrap().unwrap();
        let after = exhibit.state().stats;

        if result.won {
            assert_eq!(after.lck, before.lck + 2);
            assert_eq!(after.str, before.str + 1);
        } else {
            assert_eq!(after.wis, before.wis + 3);
        }
        assert_eq!(exhibit.state().battle_history.len(), 1);
        assert_eq!(exhibit.state().last_battle_time, Some(now()));
        assert!(!exhibit.battle_in_progress());
    }

    #[test]
    fn test_battle_skipped_while_guard_held() {
        let mut exhibit = exhibit();
        exhibit.submit("hello", AnalysisResult::default(), now()).unwrap();

        let held = exhibit.battles.try_acquire();
        assert!(held.is_some());
        assert!(exhibit.trigger_battle(now()).unwrap().is_none());
        assert!(exhibit.state().battle_history.is_empty());

        drop(held);
        assert!(exhibit.trigger_battle(now()).unwrap().is_some());
    }

    #[test]
    fn test_image_cadence() {
        assert!(should_generate_image(false, 3, 5));
        assert!(should_generate_image(true, 1, 5));
        assert!(should_generate_image(true, 10, 5));
        assert!(!should_generate_image(true, 7, 5));
    }

    #[test]
    fn test_snapshot_labels() {
        let exhibit = exhibit();
        let before = exhibit.snapshot(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(before.day_label(), "STANDBY");

        let during = exhibit.snapshot(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap());
        assert_eq!(during.day_label(), "DAY2");
        assert_eq!(during.stage, Stage::Human);
        assert!(!during.has_image);
    }

    #[test]
    fn test_failed_save_leaves_submission_unapplied() {
        let (mut exhibit, failing) = flaky_exhibit();
        failing.store(true, Ordering::SeqCst);

        let analysis = AnalysisResult::from_value(&json!({
            "statChanges": {"CHA": 5},
            "newTraits": ["x"],
            "epithet": "ゆうしゃ"
        }));
        let result = exhibit.submit("hi", analysis.clone(), now());
        assert!(matches!(result, Err(AotaError::StorageError(_))));

        let state = exhibit.state();
        assert_eq!(state.stats.cha, 30);
        assert!(state.traits.is_empty());
        assert!(state.epithet.is_empty());
        assert_eq!(state.total_input_count, 0);
        assert!(state.entries.is_empty());
        assert!(state.change_history.is_empty());
        assert!(!exhibit.is_processing());

        failing.store(false, Ordering::SeqCst);
        exhibit.submit("hi", analysis, now()).unwrap();
        assert_eq!(exhibit.state().stats.cha, 35);
        assert_eq!(exhibit.state().total_input_count, 1);
    }

    #[test]
    fn test_failed_save_leaves_battle_unrecorded() {
        let (mut exhibit, failing) = flaky_exhibit();
        exhibit.submit("hello", AnalysisResult::default(), now()).unwrap();
        let before = exhibit.state().clone();

        failing.store(true, Ordering::SeqCst);
        let result = exhibit.trigger_battle(now());
        assert!(matches!(result, Err(AotaError::StorageError(_))));

        assert_eq!(exhibit.state(), &before);
        assert!(exhibit.state().last_battle_time.is_none());
        assert!(!exhibit.battle_in_progress());

        failing.store(false, Ordering::SeqCst);
        assert!(exhibit.trigger_battle(now()).unwrap().is_some());
        assert_eq!(exhibit.state().battle_history.len(), 1);
    }
}
