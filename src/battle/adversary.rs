//! Adversary catalog
//!
//! Fixed opponents; each battle picks one uniformly and scales it by stage.

use rand::Rng;
use serde::Serialize;

use crate::battle::constants::STAGE_SCALE_STEP;
use crate::progression::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Adversary {
    pub name: &'static str,
    pub base_hp: u32,
    pub base_attack: u32,
    /// Line shown when the adversary appears
    pub flavor: &'static str,
}

pub const ADVERSARIES: [Adversary; 9] = [
    Adversary { name: "THE ALGORITHM", base_hp: 60, base_attack: 12, flavor: "アルゴリズムが襲いかかる！" },
    Adversary { name: "UNKNOWN USER", base_hp: 45, base_attack: 10, flavor: "見知らぬユーザーが現れた！" },
    Adversary { name: "SOCIAL PRESSURE", base_hp: 70, base_attack: 14, flavor: "社会的圧力が立ちはだかる！" },
    Adversary { name: "IMPOSTOR.SYS", base_hp: 55, base_attack: 11, flavor: "インポスター症候群が発動した！" },
    Adversary { name: "THE VOID", base_hp: 80, base_attack: 15, flavor: "虚無が広がっていく…" },
    Adversary { name: "AVERAGE OPINION", base_hp: 50, base_attack: 9, flavor: "平均的意見の群れが押し寄せる！" },
    Adversary { name: "EXPECTATION", base_hp: 65, base_attack: 13, flavor: "期待という名の重圧が！" },
    Adversary { name: "COLLECTIVE_DOUBT", base_hp: 75, base_attack: 14, flavor: "集合的疑念が渦巻く！" },
    Adversary { name: "STATUS_QUO", base_hp: 85, base_attack: 16, flavor: "現状維持の壁が立ちふさがる！" },
];

/// Pick an adversary uniformly from the catalog
pub fn choose_adversary<R: Rng + ?Sized>(rng: &mut R) -> &'static Adversary {
    &ADVERSARIES[rng.gen_range(0..ADVERSARIES.len())]
}

pub fn find_adversary(name: &str) -> Option<&'static Adversary> {
    ADVERSARIES.iter().find(|a| a.name == name)
}

/// Multiplier applied to HP and attack: 1.0 at stage 1, +0.25 per stage
pub fn stage_scale(stage: Stage) -> f64 {
    1.0 + (stage.ordinal() as f64 - 1.0) * STAGE_SCALE_STEP
}

/// An adversary instantiated for one battle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledAdversary {
    pub name: &'static str,
    pub flavor: &'static str,
    pub max_hp: u32,
    pub attack: u32,
}

impl Adversary {
    pub fn scaled(&self, stage: Stage) -> ScaledAdversary {
        let scale = stage_scale(stage);
        ScaledAdversary {
            name: self.name,
            flavor: self.flavor,
            max_hp: (self.base_hp as f64 * scale).floor() as u32,
            attack: (self.base_attack as f64 * scale).floor() as u32,
        }
    }
}
