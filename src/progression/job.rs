//! Job classification from the attribute distribution
//!
//! The two highest attributes pick the job. When they are within
//! COMBO_MARGIN of each other the pair decides; otherwise the top one alone.

use crate::core::types::{StatCode, Stats};
use serde::Serialize;

/// Largest gap between the top two attributes that still yields a combination job
pub const COMBO_MARGIN: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Job {
    pub name: &'static str,
    pub description: &'static str,
}

impl Job {
    const fn new(name: &'static str, description: &'static str) -> Self {
        Self { name, description }
    }
}

/// Attribute codes ranked highest first
///
/// The sort is stable over `StatCode::ALL`, so ties always resolve
/// STR > INT > AGI > CHA > WIS > LCK.
pub fn rank_stats(stats: &Stats) -> [(StatCode, u8); 6] {
    let mut ranked = StatCode::ALL.map(|code| (code, stats.get(code)));
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Job for the current attributes
pub fn job_of(stats: &Stats) -> Job {
    let ranked = rank_stats(stats);
    let (top1, v1) = ranked[0];
    let (top2, v2) = ranked[1];

    if v1 - v2 <= COMBO_MARGIN {
        if let Some(job) = combo_job(top1, top2) {
            return job;
        }
    }
    solo_job(top1)
}

/// Job led by a single attribute
pub fn solo_job(code: StatCode) -> Job {
    match code {
        StatCode::Str => Job::new("せんし", "ちからこそすべて"),
        StatCode::Int => Job::new("まほうつかい", "ちしきのたんきゅうしゃ"),
        StatCode::Agi => Job::new("とうぞく", "すばやさがじまん"),
        StatCode::Cha => Job::new("しょうにん", "ひとをひきつけるもの"),
        StatCode::Wis => Job::new("そうりょ", "いのりのちからをもつ"),
        StatCode::Lck => Job::new("あそびにん", "うんにみちびかれしもの"),
    }
}

/// Job for an unordered pair of attributes
pub fn combo_job(a: StatCode, b: StatCode) -> Option<Job> {
    use StatCode::*;

    let pair = if a <= b { (a, b) } else { (b, a) };
    let job = match pair {
        (Str, Int) => Job::new("まけんし", "けんとまほうのつかいて"),
        (Str, Agi) => Job::new("ぶとうか", "けんとあしわざのたつじん"),
        (Str, Cha) => Job::new("バトルマスター", "たたかいをきわめしもの"),
        (Str, Wis) => Job::new("パラディン", "せいなるちからのまもりて"),
        (Str, Lck) => Job::new("ギャンブラー", "いちかばちかのしょうぶし"),
        (Int, Agi) => Job::new("にんじゃ", "かげにひそむもの"),
        (Int, Cha) => Job::new("スーパースター", "みんなのあこがれ"),
        (Int, Wis) => Job::new("けんじゃ", "しんりをきわめしもの"),
        (Int, Lck) => Job::new("てんさい", "うんめいにあいされしもの"),
        (Agi, Cha) => Job::new("おどりこ", "まいでひとをみりょうする"),
        (Agi, Wis) => Job::new("レンジャー", "しぜんとともにいきる"),
        (Agi, Lck) => Job::new("かいぞく", "じゆうなるぼうけんしゃ"),
        (Cha, Wis) => Job::new("しんかんし", "ひとのこころをいやす"),
        (Cha, Lck) => Job::new("ゆうしゃ", "せかいをすくうもの"),
        (Wis, Lck) => Job::new("ほしよみ", "うんめいをよみとくもの"),
        _ => return None,
    };
    Some(job)
}
