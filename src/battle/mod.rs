//! Battle system - periodic automatic encounters
//!
//! Once an hour the character fights a random adversary scaled to its
//! current stage. The result feeds back into the attributes: a win grants
//! LCK and STR, a loss grants WIS.

pub mod adversary;
pub mod constants;
pub mod scheduler;
pub mod simulator;
pub mod transcript;

pub use adversary::{choose_adversary, find_adversary, Adversary, ScaledAdversary, ADVERSARIES};
pub use constants::*;
pub use scheduler::{BattleScheduler, SchedulerPhase, TimerFire};
pub use simulator::{battle_reward, resolve_battle, simulate, PlayerProfile, CHARACTER_NAME};
pub use transcript::{BattleResult, LogKind, LogLine, Transcript};
