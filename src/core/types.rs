//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lowest value any attribute can take
pub const STAT_MIN: u8 = 1;
/// Highest value any attribute can take
pub const STAT_MAX: u8 = 99;
/// Value every attribute starts at
pub const STAT_DEFAULT: u8 = 30;

/// Attribute deltas keyed by code, as produced by the text analysis
///
/// Keys are raw strings: unknown codes are carried through and ignored when
/// the deltas are applied.
pub type StatDeltas = BTreeMap<String, i64>;

/// The six attribute codes
///
/// Declaration order is the fixed ranking order used to break ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatCode {
    Str,
    Int,
    Agi,
    Cha,
    Wis,
    Lck,
}

impl StatCode {
    pub const ALL: [StatCode; 6] = [
        StatCode::Str,
        StatCode::Int,
        StatCode::Agi,
        StatCode::Cha,
        StatCode::Wis,
        StatCode::Lck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatCode::Str => "STR",
            StatCode::Int => "INT",
            StatCode::Agi => "AGI",
            StatCode::Cha => "CHA",
            StatCode::Wis => "WIS",
            StatCode::Lck => "LCK",
        }
    }
}

impl fmt::Display for StatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or(())
    }
}

fn default_stat() -> u8 {
    STAT_DEFAULT
}

/// The six bounded attributes
///
/// Every code is always present. Serialized as `{"STR":30,"INT":30,...}`;
/// a missing key in a stored record comes back at the default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(rename = "STR", default = "default_stat")]
    pub str: u8,
    #[serde(rename = "INT", default = "default_stat")]
    pub int: u8,
    #[serde(rename = "AGI", default = "default_stat")]
    pub agi: u8,
    #[serde(rename = "CHA", default = "default_stat")]
    pub cha: u8,
    #[serde(rename = "WIS", default = "default_stat")]
    pub wis: u8,
    #[serde(rename = "LCK", default = "default_stat")]
    pub lck: u8,
}

impl Default for Stats {
    fn default() -> Self {
        Self::uniform(STAT_DEFAULT)
    }
}

impl Stats {
    pub fn uniform(value: u8) -> Self {
        let v = clamp_stat(value as i64);
        Self {
            str: v,
            int: v,
            agi: v,
            cha: v,
            wis: v,
            lck: v,
        }
    }

    pub fn get(&self, code: StatCode) -> u8 {
        match code {
            StatCode::Str => self.str,
            StatCode::Int => self.int,
            StatCode::Agi => self.agi,
            StatCode::Cha => self.cha,
            StatCode::Wis => self.wis,
            StatCode::Lck => self.lck,
        }
    }

    /// Set a value, clamped into [STAT_MIN, STAT_MAX]
    pub fn set(&mut self, code: StatCode, value: i64) {
        let slot = match code {
            StatCode::Str => &mut self.str,
            StatCode::Int => &mut self.int,
            StatCode::Agi => &mut self.agi,
            StatCode::Cha => &mut self.cha,
            StatCode::Wis => &mut self.wis,
            StatCode::Lck => &mut self.lck,
        };
        *slot = clamp_stat(value);
    }

    /// Add a delta, absorbing any overflow by clamping
    pub fn adjust(&mut self, code: StatCode, delta: i64) {
        let current = self.get(code) as i64;
        self.set(code, current.saturating_add(delta));
    }

    /// Pull every value back into range (used after loading a stored record)
    pub fn normalize(&mut self) {
        for code in StatCode::ALL {
            let value = self.get(code) as i64;
            self.set(code, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatCode, u8)> + '_ {
        StatCode::ALL.into_iter().map(move |code| (code, self.get(code)))
    }
}

fn clamp_stat(value: i64) -> u8 {
    value.clamp(STAT_MIN as i64, STAT_MAX as i64) as u8
}
