// Engine module organization
// Each submodule adds one phase of the generation to `Engine`

pub mod crossover;
pub mod metrics;
pub mod mutations;
pub mod rollback;
pub mod selection;

use std::path::Path;
use std::sync::Arc;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::app_types::{BestExport, GenerationResult, GenomeState};
use crate::dna::Chromosome;
use crate::error::Result;
use crate::evaluator::{EvaluationContext, FitnessEvaluator};
use crate::fitness::FitnessMetric;
use crate::reference::ReferenceImage;
use crate::render::{CpuRenderer, Rasterizer};
use crate::settings::RunSettings;

use rollback::ComplianceGuard;

/// generational evolution engine. owns a fixed arena of chromosome slots; every
/// generation overwrites the worst slots in place instead of reallocating.
pub struct Engine {
    pub(self) rng: Pcg32,
    pub(self) settings: RunSettings,
    pub(self) population: Vec<Chromosome>, // sorted best-first after each selection
    pub(self) elite_count: usize,          // prefix of `population` kept as parents
    pub(self) sum_fitness: f64,            // roulette weight over the elite prefix
    pub(self) evaluator: Box<dyn FitnessEvaluator>,
    pub(self) context: Arc<EvaluationContext>,
    pub(self) guard: Option<ComplianceGuard>,
    pub(self) display_width: u32,
    pub(self) display_height: u32,
    pub(self) state: GenomeState,
}

/// optional overrides for the collaborators `Engine::new` would build from settings
#[derive(Default)]
pub struct EngineBuilder {
    rasterizer: Option<Arc<dyn Rasterizer>>,
    evaluator: Option<Box<dyn FitnessEvaluator>>,
    fitness_metric: Option<Arc<dyn FitnessMetric>>,
    compliance_metric: Option<Arc<dyn FitnessMetric>>,
}

impl EngineBuilder {
    pub fn rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn evaluator(mut self, evaluator: Box<dyn FitnessEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn fitness_metric(mut self, metric: Arc<dyn FitnessMetric>) -> Self {
        self.fitness_metric = Some(metric);
        self
    }

    /// only used when `settings.compliance.enabled`
    pub fn compliance_metric(mut self, metric: Arc<dyn FitnessMetric>) -> Self {
        self.compliance_metric = Some(metric);
        self
    }

    /// validate settings, downsample the reference and seed the population
    pub fn build(self, reference: ReferenceImage, settings: RunSettings) -> Result<Engine> {
        profiling::scope!("EngineBuilder::build");
        settings.validate()?;

        let display_width = reference.width();
        let display_height = reference.height();
        let compute = reference.resized(settings.compute_width, settings.compute_height)?;
        let ratio = settings.compute_width as f32 / display_width as f32;

        let rasterizer = self
            .rasterizer
            .unwrap_or_else(|| Arc::new(CpuRenderer::new(settings.radius, settings.antialiasing)));
        let metric = self.fitness_metric.unwrap_or_else(|| settings.fitness.build());
        let evaluator = match self.evaluator {
            Some(e) => e,
            None => settings.evaluation.build()?,
        };
        let guard = settings.compliance.enabled.then(|| {
            ComplianceGuard::new(self.compliance_metric.unwrap_or_else(|| settings.compliance.metric.build()))
        });

        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let population = (0..settings.population_size)
            .map(|_| Chromosome::random(settings.circles, settings.gene_encoding, &mut rng))
            .collect();

        log::info!(
            "engine ready: {} chromosomes x {} circles, display {}x{}, compute {}x{} (ratio {:.3}), metric {}",
            settings.population_size,
            settings.circles,
            display_width,
            display_height,
            settings.compute_width,
            settings.compute_height,
            ratio,
            metric.name()
        );

        let state = GenomeState { max_generation: settings.max_generation, ..GenomeState::default() };
        Ok(Engine {
            rng,
            elite_count: settings.elite_count(),
            settings,
            population,
            sum_fitness: 0.0,
            evaluator,
            context: Arc::new(EvaluationContext {
                reference: Arc::new(compute),
                ratio,
                rasterizer,
                metric,
            }),
            guard,
            display_width,
            display_height,
            state,
        })
    }
}

impl Engine {
    /// engine with every collaborator built from `settings`
    pub fn new(reference: ReferenceImage, settings: RunSettings) -> Result<Self> {
        EngineBuilder::default().build(reference, settings)
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// one generation: evaluate, select, (rollback check), crossover, mutate.
    /// a no-op once `generation == max_generation`
    pub fn step(&mut self) -> Result<GenerationResult> {
        profiling::scope!("Engine::step");
        if self.is_finished() {
            return Ok(GenerationResult { report: self.report(false), advanced: false });
        }

        // barrier: every slot has a fresh fitness before selection looks at any of them
        self.evaluator.evaluate(&mut self.population, &self.context)?;
        self.state.generation += 1;

        self.make_selection();
        let rolled_back = self.apply_rollback();
        self.make_crossover()?;

        // the last generation's best genome must stay exactly as it was scored
        if self.state.generation != self.state.max_generation {
            self.make_mutation();
        }

        let report = self.report(rolled_back);
        log::debug!(
            "generation {}/{}: best {:.5}, compliance {:.5}{}",
            report.generation,
            report.max_generation,
            report.best_fitness,
            report.compliance,
            if rolled_back { " (rolled back)" } else { "" }
        );
        Ok(GenerationResult { report, advanced: true })
    }

    /// add `generations` to the budget
    pub fn extend(&mut self, generations: u64) {
        self.state.max_generation = self.state.max_generation.saturating_add(generations);
    }

    /// request `generations` more generations. before the first generation the
    /// budget becomes exactly `generations`; afterwards it accumulates like `extend`
    pub fn schedule(&mut self, generations: u64) {
        if self.state.generation == 0 {
            self.state.max_generation = generations;
        } else {
            self.extend(generations);
        }
    }

    /// fresh random population, counters back to zero, budget from settings
    pub fn reset(&mut self) {
        profiling::scope!("Engine::reset");
        for slot in self.population.iter_mut() {
            *slot = Chromosome::random(self.settings.circles, self.settings.gene_encoding, &mut self.rng);
        }
        self.sum_fitness = 0.0;
        if let Some(guard) = self.guard.as_mut() {
            guard.clear();
        }
        self.state = GenomeState { max_generation: self.settings.max_generation, ..GenomeState::default() };
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state.generation >= self.state.max_generation
    }

    #[inline]
    pub fn state(&self) -> GenomeState {
        self.state
    }

    #[inline]
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    #[inline]
    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    /// top chromosome of the latest selection (arbitrary before the first generation)
    #[inline]
    pub fn best(&self) -> &Chromosome {
        &self.population[0]
    }

    /// population saved at the best compliance point, if the guard is enabled
    pub fn best_iteration_so_far(&self) -> Option<&[Chromosome]> {
        self.guard.as_ref().and_then(|g| g.snapshot())
    }

    #[inline]
    pub fn display_size(&self) -> (u32, u32) {
        (self.display_width, self.display_height)
    }

    /// best chromosome rasterized at display resolution, straight RGBA
    pub fn render_best(&self) -> Vec<u8> {
        profiling::scope!("Engine::render_best");
        self.context
            .rasterizer
            .rasterize(self.best(), self.display_width, self.display_height, 1.0)
    }

    /// best chromosome and counters, ready for serde
    pub fn export_best(&self) -> BestExport {
        BestExport {
            state: self.state,
            width: self.display_width,
            height: self.display_height,
            chromosome: self.best().clone(),
        }
    }

    /// write `export_best` as pretty JSON
    pub fn save_best(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.export_best())?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
