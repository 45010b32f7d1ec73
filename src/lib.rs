//! AOTA.EXE - Character progression and battle engine for an interactive exhibit

pub mod battle;
pub mod core;
pub mod exhibit;
pub mod llm;
pub mod persistence;
pub mod progression;
