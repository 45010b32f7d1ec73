//! Property tests for the progression and battle invariants

use aota_engine::battle::{resolve_battle, PlayerProfile, MAX_ROUNDS};
use aota_engine::core::types::{StatDeltas, Stats, STAT_MAX, STAT_MIN};
use aota_engine::progression::job::job_of;
use aota_engine::progression::stage::stage_of;
use aota_engine::progression::state::{ProgressionState, MAX_TRAITS};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const CODES: [&str; 7] = ["STR", "INT", "AGI", "CHA", "WIS", "LCK", "DEX"];

fn deltas_strategy() -> impl Strategy<Value = StatDeltas> {
    prop::collection::btree_map(
        prop::sample::select(CODES.to_vec()).prop_map(String::from),
        -1000i64..1000,
        0..7,
    )
}

fn stats_strategy() -> impl Strategy<Value = Stats> {
    prop::array::uniform6(STAT_MIN..=STAT_MAX).prop_map(|v| Stats {
        str: v[0],
        int: v[1],
        agi: v[2],
        cha: v[3],
        wis: v[4],
        lck: v[5],
    })
}

proptest! {
    #[test]
    fn stats_stay_in_range(batches in prop::collection::vec(deltas_strategy(), 0..20)) {
        let mut state = ProgressionState::new();
        for deltas in &batches {
            state.apply_stat_changes(deltas);
            for (_, value) in state.stats.iter() {
                prop_assert!((STAT_MIN..=STAT_MAX).contains(&value));
            }
        }
    }

    #[test]
    fn traits_are_capped_and_unique(
        batches in prop::collection::vec(prop::collection::vec("[a-p]{1,2}", 0..5), 0..15)
    ) {
        let mut state = ProgressionState::new();
        for batch in &batches {
            state.add_traits(batch);
            prop_assert!(state.traits.len() <= MAX_TRAITS);
            let mut sorted = state.traits.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), state.traits.len());
        }
    }

    #[test]
    fn stage_never_regresses(count in 0u32..200) {
        prop_assert!(stage_of(count) <= stage_of(count + 1));
    }

    #[test]
    fn job_depends_only_on_stats(stats in stats_strategy()) {
        prop_assert_eq!(job_of(&stats), job_of(&stats));
    }

    #[test]
    fn battles_stay_bounded(stats in stats_strategy(), count in 0u32..120, seed in any::<u64>()) {
        let mut state = ProgressionState::new();
        state.stats = stats;
        state.total_input_count = count;

        let profile = PlayerProfile::derive(&stats, count);
        prop_assert!(profile.max_hp >= 50);

        let at = Utc.with_ymd_and_hms(2025, 3, 6, 15, 0, 0).unwrap();
        let result = resolve_battle(&state, &mut ChaCha8Rng::seed_from_u64(seed), at);
        prop_assert!(result.rounds >= 1 && result.rounds <= MAX_ROUNDS);
        prop_assert!(result.player_hp <= result.player_max_hp);
        prop_assert!(result.adversary_hp <= result.adversary_max_hp);
        if result.adversary_hp == 0 {
            prop_assert!(result.won);
        }
        if result.player_hp == 0 {
            prop_assert!(!result.won);
        }
    }
}
