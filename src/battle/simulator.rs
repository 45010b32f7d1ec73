//! Turn-based battle resolution
//!
//! One call resolves one encounter from start to finish. All randomness comes
//! from the injected RNG, so a seeded RNG replays the same battle.
//!
//! Round structure: the character attacks, then (if the adversary survives)
//! the adversary attacks. The battle ends the moment either side hits 0 HP,
//! or after MAX_ROUNDS. Surviving the full MAX_ROUNDS counts as a win: the
//! adversary flees.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::battle::adversary::{choose_adversary, ScaledAdversary};
use crate::battle::constants::*;
use crate::battle::transcript::{BattleResult, LogKind, Transcript};
use crate::core::types::{StatDeltas, Stats};
use crate::progression::state::ProgressionState;

/// Name the character is called by in transcripts
pub const CHARACTER_NAME: &str = "AOTA";

/// Combat numbers derived from the character's attributes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerProfile {
    pub max_hp: u32,
    pub attack: f64,
    pub crit_rate: f64,
    pub dodge_rate: f64,
}

impl PlayerProfile {
    pub fn derive(stats: &Stats, total_input_count: u32) -> Self {
        let str_ = stats.str as f64;
        let agi = stats.agi as f64;
        let lck = stats.lck as f64;

        Self {
            max_hp: (PLAYER_BASE_HP + str_ * HP_PER_STR + total_input_count as f64 * HP_PER_INPUT)
                .floor() as u32,
            attack: str_ * ATTACK_PER_STR + agi * ATTACK_PER_AGI + lck * ATTACK_PER_LCK,
            crit_rate: lck / CRIT_DIVISOR,
            dodge_rate: agi / DODGE_DIVISOR,
        }
    }
}

/// Attribute reward for a finished battle
pub fn battle_reward(won: bool) -> StatDeltas {
    let pairs: &[(&str, i64)] = if won {
        &[("LCK", 2), ("STR", 1)]
    } else {
        &[("WIS", 3)]
    };
    pairs.iter().map(|(code, d)| (code.to_string(), *d)).collect()
}

/// Roll damage for a base attack: floor(base * U[0.8, 1.2))
fn roll_damage<R: Rng + ?Sized>(base: f64, rng: &mut R) -> u32 {
    let multiplier = DAMAGE_ROLL_MIN + rng.gen::<f64>() * DAMAGE_ROLL_SPAN;
    (base * multiplier).floor() as u32
}

/// Resolve one battle between the character and an already scaled adversary
pub fn simulate<R: Rng + ?Sized>(
    player: &PlayerProfile,
    adversary: &ScaledAdversary,
    rng: &mut R,
    at: DateTime<Utc>,
) -> BattleResult {
    let mut player_hp = player.max_hp;
    let mut adversary_hp = adversary.max_hp;
    let mut log = Transcript::new();
    let mut rounds = 0;

    log.push(LogKind::Appear, adversary.flavor);
    log.push(
        LogKind::Info,
        format!("{}  HP:{}", adversary.name, adversary_hp),
    );

    while player_hp > 0 && adversary_hp > 0 && rounds < MAX_ROUNDS {
        rounds += 1;

        // Character's turn
        let is_crit = rng.gen::<f64>() < player.crit_rate;
        let mut damage = roll_damage(player.attack, rng);
        if is_crit {
            damage = (damage as f64 * CRIT_MULTIPLIER).floor() as u32;
            log.push(
                LogKind::Crit,
                format!("かいしんの いちげき！ {}のダメージ！", damage),
            );
        } else {
            log.push(
                LogKind::Attack,
                format!("{}のこうげき！ {}のダメージ！", CHARACTER_NAME, damage),
            );
        }
        adversary_hp = adversary_hp.saturating_sub(damage);

        if adversary_hp == 0 {
            log.push(LogKind::Defeat, format!("{}をたおした！", adversary.name));
            break;
        }

        // Adversary's turn
        if rng.gen::<f64>() < player.dodge_rate {
            log.push(
                LogKind::Dodge,
                format!("{}はひらりとみをかわした！", CHARACTER_NAME),
            );
        } else {
            let damage = roll_damage(adversary.attack as f64, rng);
            player_hp = player_hp.saturating_sub(damage);
            log.push(
                LogKind::EnemyAttack,
                format!("{}のこうげき！ {}のダメージ！", adversary.name, damage),
            );
        }

        if player_hp == 0 {
            log.push(
                LogKind::Lose,
                format!("{}はたおれてしまった…", CHARACTER_NAME),
            );
            break;
        }
    }

    let timed_out = rounds >= MAX_ROUNDS && player_hp > 0 && adversary_hp > 0;
    if timed_out {
        log.push(LogKind::Draw, format!("{}は逃げ出した！", adversary.name));
    }

    let won = adversary_hp == 0 || timed_out;
    if won {
        log.push(LogKind::Result, "たたかいに しょうりした！");
        log.push(LogKind::Bonus, "LCK+2 STR+1 を獲得！");
    } else {
        log.push(LogKind::Result, "たたかいに やぶれた…");
        log.push(LogKind::Bonus, "WIS+3 を獲得（経験は力なり）");
    }

    BattleResult {
        adversary: adversary.name.to_string(),
        won,
        rounds,
        log,
        player_hp,
        player_max_hp: player.max_hp,
        adversary_hp,
        adversary_max_hp: adversary.max_hp,
        resolved_at: at,
    }
}

/// Pick an adversary, scale it to the current stage, and fight it
pub fn resolve_battle<R: Rng + ?Sized>(
    state: &ProgressionState,
    rng: &mut R,
    at: DateTime<Utc>,
) -> BattleResult {
    let adversary = choose_adversary(rng).scaled(state.stage());
    let player = PlayerProfile::derive(&state.stats, state.total_input_count);

    tracing::debug!(
        adversary = adversary.name,
        adversary_hp = adversary.max_hp,
        player_hp = player.max_hp,
        "Battle starting"
    );

    simulate(&player, &adversary, rng, at)
}
