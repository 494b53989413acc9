//! run settings for circle-evolve
//! loaded from / saved to JSON; every field has a default so partial files work
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dna::GeneEncoding;
use crate::error::{EvolveError, Result};
use crate::evaluator::EvaluationMode;
use crate::fitness::{MetricKind, MetricSettings};
use crate::render::RadiusRange;

/// offspring splice strategy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverKind {
    /// A[..k] ++ B[k..]
    SinglePoint,
    /// A[..k1] ++ B[k1..k2] ++ A[k2..]
    TwoPoint,
}

/// how parents are drawn from the elite slice
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentSelection {
    /// fitness-proportionate (roulette wheel)
    Roulette,
    Uniform,
}

/// elitist rollback guard. compliance is scored on the best chromosome with its
/// own metric, independent of the selection metric
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSettings {
    pub enabled: bool,
    pub metric: MetricSettings,
}

impl Default for ComplianceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            // every 5th pixel, channel-averaged
            metric: MetricSettings::new(MetricKind::Strict, 5),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    // population
    pub population_size: usize,
    /// initial generation budget (`Engine::extend` adds to it)
    pub max_generation: u64,
    pub mutation_rate: f64,  // per-chromosome probability of one gene re-roll
    pub selection_rate: f64, // elite fraction kept each generation, (0, 1]
    pub mutate_elites: bool,

    // genome
    pub circles: usize,
    pub gene_encoding: GeneEncoding,
    pub crossover: CrossoverKind,
    pub parent_selection: ParentSelection,

    // scoring
    pub fitness: MetricSettings,
    pub compliance: ComplianceSettings,
    pub evaluation: EvaluationMode,
    /// resolution used for fitness; radii scale by compute_width / display width
    pub compute_width: u32,
    pub compute_height: u32,

    // rendering
    pub radius: RadiusRange,
    pub antialiasing: bool,

    pub seed: u64,
    /// log progress every N generations (0 = only at the end)
    pub log_interval: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            population_size: 800,
            max_generation: 20_000,
            mutation_rate: 0.3,
            selection_rate: 0.4,
            mutate_elites: true,

            circles: 150,
            gene_encoding: GeneEncoding::Circle,
            crossover: CrossoverKind::SinglePoint,
            parent_selection: ParentSelection::Roulette,

            fitness: MetricSettings::new(MetricKind::Difference, 1),
            compliance: ComplianceSettings::default(),
            evaluation: EvaluationMode::Synchronous,
            compute_width: 75,
            compute_height: 75,

            radius: RadiusRange::default(),
            antialiasing: true,

            seed: 0xDEADBEEF,
            log_interval: 100,
        }
    }
}

impl RunSettings {
    /// reject anything the engine cannot run with. called before the first generation
    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: String) -> Result<()> {
            Err(EvolveError::InvalidConfiguration(msg))
        }

        if self.population_size == 0 {
            return invalid("population_size must be > 0".to_owned());
        }
        if self.max_generation == 0 {
            return invalid("max_generation must be > 0".to_owned());
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return invalid(format!("mutation_rate must be in [0, 1], got {}", self.mutation_rate));
        }
        if !(self.selection_rate > 0.0 && self.selection_rate <= 1.0) {
            return invalid(format!("selection_rate must be in (0, 1], got {}", self.selection_rate));
        }
        if self.circles == 0 {
            return invalid("circles must be > 0".to_owned());
        }
        if self.compute_width == 0 || self.compute_height == 0 {
            return invalid(format!(
                "compute resolution must be positive, got {}x{}",
                self.compute_width, self.compute_height
            ));
        }
        if !(self.radius.min >= 0.0 && self.radius.max >= self.radius.min && self.radius.max.is_finite()) {
            return invalid(format!(
                "radius range must satisfy 0 <= min <= max, got {}..{}",
                self.radius.min, self.radius.max
            ));
        }
        if self.fitness.stride == 0 || self.compliance.metric.stride == 0 {
            return invalid("metric sampling stride must be > 0".to_owned());
        }
        if let EvaluationMode::Parallel { timeout_ms: Some(0), .. } = self.evaluation {
            return invalid("parallel evaluation timeout must be > 0 ms".to_owned());
        }
        Ok(())
    }

    /// number of elite slots for a population, never 0 so crossover always has a parent
    pub fn elite_count(&self) -> usize {
        let n = (self.selection_rate * self.population_size as f64).round() as usize;
        n.clamp(1, self.population_size.max(1))
    }

    /// save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// load settings, or defaults if the file is missing or unreadable
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("failed to parse {}: {}. using defaults.", path.display(), e);
                    Self::default()
                }
            },
            // file doesn't exist or can't be read
            Err(_) => Self::default(),
        }
    }

    /// load settings, surfacing i/o and parse errors
    pub fn load_strict(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
