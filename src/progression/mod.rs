pub mod analysis;
pub mod job;
pub mod stage;
pub mod state;
pub mod store;

pub use analysis::AnalysisResult;
pub use job::{job_of, Job};
pub use stage::{next_threshold, stage_of, EvolutionProgress, Stage};
pub use state::{ChangeRecord, Entry, ProgressionState};
pub use store::AttributeStore;
