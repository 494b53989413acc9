//! evolve a population of translucent circle genomes toward a reference image

pub mod app_types;
pub mod dna;
pub mod driver;
pub mod engine;
pub mod engine_thread;
pub mod error;
pub mod evaluator;
pub mod fitness;
pub mod gene;
pub mod reference;
pub mod render;
pub mod settings;

pub use app_types::{GenerationReport, GenerationResult, GenomeState, RunPhase};
pub use dna::{Chromosome, GeneEncoding};
pub use driver::{Driver, LogObserver, Pacing, ProgressObserver};
pub use engine::{Engine, EngineBuilder};
pub use error::{EvolveError, Result};
pub use reference::ReferenceImage;
pub use settings::RunSettings;
