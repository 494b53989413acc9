use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// process-scoped run state, updated once per generation
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenomeState {
    pub generation: u64,
    pub max_generation: u64,
    /// best compliance recorded so far (top fitness when the rollback guard is off)
    pub compliance: f64,
    /// top fitness of the latest selection
    pub best_fitness: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// no generation has run yet
    Idle,
    Running,
    /// generation budget exhausted
    Done,
}

/// what observers see after each generation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: u64,
    pub max_generation: u64,
    pub best_fitness: f64,
    pub compliance: f64,
    /// this generation regressed and the best-so-far population was restored
    pub rolled_back: bool,
    pub finished: bool,
}

/// outcome of a single `Engine::step`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationResult {
    pub report: GenerationReport,
    /// false when the engine was already done and nothing ran
    pub advanced: bool,
}

// messages from the host to the engine thread
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineCommand {
    Start,
    Pause,
    Stop,
    /// raise the generation budget (resumes a finished run when followed by Start)
    Extend(u64),
}

// messages from the engine thread to the host
#[derive(Clone, Debug)]
pub struct EngineUpdate {
    pub report: GenerationReport,
    /// best chromosome at display resolution, straight RGBA. only sent on preview ticks
    pub best_rgba: Option<Arc<[u8]>>,
    pub width: u32,
    pub height: u32,
}

/// JSON export of the best chromosome with the run counters it was taken at
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BestExport {
    pub state: GenomeState,
    pub width: u32,
    pub height: u32,
    pub chromosome: crate::dna::Chromosome,
}
