//! Battle system constants - all tunable values in one place

// Encounter length
pub const MAX_ROUNDS: u32 = 12;

// Player derivation: max HP = 50 + 0.5*STR + 1.5*inputs
pub const PLAYER_BASE_HP: f64 = 50.0;
pub const HP_PER_STR: f64 = 0.5;
pub const HP_PER_INPUT: f64 = 1.5;

// Attack power = 0.4*STR + 0.15*AGI + 0.1*LCK
pub const ATTACK_PER_STR: f64 = 0.4;
pub const ATTACK_PER_AGI: f64 = 0.15;
pub const ATTACK_PER_LCK: f64 = 0.1;

// Chance rolls
pub const CRIT_DIVISOR: f64 = 200.0; // crit = LCK / 200
pub const DODGE_DIVISOR: f64 = 300.0; // dodge = AGI / 300
pub const CRIT_MULTIPLIER: f64 = 1.8;

// Damage roll spans [0.8, 1.2)
pub const DAMAGE_ROLL_MIN: f64 = 0.8;
pub const DAMAGE_ROLL_SPAN: f64 = 0.4;

// Adversary scaling per stage above the first
pub const STAGE_SCALE_STEP: f64 = 0.25;
