use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::dna::Chromosome;
use crate::error::{EvolveError, Result};
use crate::fitness::{sanitize_score, FitnessMetric};
use crate::reference::ReferenceImage;
use crate::render::Rasterizer;

/// everything a fitness job needs. shared read-only by every job of a generation
pub struct EvaluationContext {
    /// target at the compute resolution
    pub reference: Arc<ReferenceImage>,
    /// compute width / display width, applied to circle radii
    pub ratio: f32,
    pub rasterizer: Arc<dyn Rasterizer>,
    pub metric: Arc<dyn FitnessMetric>,
}

impl EvaluationContext {
    /// rasterize at the compute resolution and score against the reference
    pub fn score(&self, chromosome: &Chromosome) -> f64 {
        profiling::scope!("EvaluationContext::score");
        self.score_with(chromosome, self.metric.as_ref())
    }

    /// same rendering, different metric (the compliance check uses this)
    pub fn score_with(&self, chromosome: &Chromosome, metric: &dyn FitnessMetric) -> f64 {
        let rendered = self.rasterizer.rasterize(
            chromosome,
            self.reference.width(),
            self.reference.height(),
            self.ratio,
        );
        sanitize_score(metric.score(self.reference.pixels(), &rendered))
    }
}

/// fills the cached fitness of every chromosome. returns only once all of them
/// are evaluated (or with an error, in which case none should be trusted)
pub trait FitnessEvaluator: Send {
    fn evaluate(&self, population: &mut [Chromosome], ctx: &Arc<EvaluationContext>) -> Result<()>;
}

/// one chromosome after the other on the calling thread
#[derive(Clone, Copy, Debug, Default)]
pub struct SyncEvaluator;

impl FitnessEvaluator for SyncEvaluator {
    fn evaluate(&self, population: &mut [Chromosome], ctx: &Arc<EvaluationContext>) -> Result<()> {
        profiling::scope!("SyncEvaluator::evaluate");
        for chromosome in population.iter_mut() {
            chromosome.compute_fitness(ctx);
        }
        Ok(())
    }
}

/// dispatches one job per chromosome to a dedicated rayon pool and waits for all
/// of them. a job that misses the deadline, or a worker that dies, fails the call
pub struct PoolEvaluator {
    pool: rayon::ThreadPool,
    timeout: Option<Duration>,
}

impl PoolEvaluator {
    /// `workers == 0` lets rayon pick the thread count
    pub fn new(workers: usize, timeout: Option<Duration>) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("fitness-{i}"))
            // a panicking job drops its sender; the barrier reports it instead of aborting
            .panic_handler(|_| log::error!("fitness worker panicked"))
            .build()
            .map_err(|e| EvolveError::WorkerPool(e.to_string()))?;
        Ok(Self { pool, timeout })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl FitnessEvaluator for PoolEvaluator {
    fn evaluate(&self, population: &mut [Chromosome], ctx: &Arc<EvaluationContext>) -> Result<()> {
        profiling::scope!("PoolEvaluator::evaluate");
        let total = population.len();
        let (tx, rx) = mpsc::channel::<(usize, f64)>();

        for (idx, chromosome) in population.iter().enumerate() {
            let job = chromosome.clone();
            let ctx = Arc::clone(ctx);
            let tx = tx.clone();
            self.pool.spawn(move || {
                let fitness = ctx.score(&job);
                // receiver gone means the barrier already gave up
                let _ = tx.send((idx, fitness));
            });
        }
        drop(tx);

        let deadline = self.timeout.map(|t| (t, Instant::now() + t));
        let mut results: Vec<Option<f64>> = vec![None; total];
        let mut received = 0usize;

        while received < total {
            let (idx, fitness) = match deadline {
                Some((timeout, at)) => {
                    let remaining = at.saturating_duration_since(Instant::now());
                    rx.recv_timeout(remaining).map_err(|e| match e {
                        mpsc::RecvTimeoutError::Timeout => EvolveError::ConcurrencyTimeout {
                            timeout,
                            pending: total - received,
                            total,
                        },
                        mpsc::RecvTimeoutError::Disconnected => worker_lost(total - received),
                    })?
                }
                None => rx.recv().map_err(|_| worker_lost(total - received))?,
            };
            if results[idx].replace(fitness).is_none() {
                received += 1;
            }
        }

        for (chromosome, fitness) in population.iter_mut().zip(results) {
            if let Some(f) = fitness {
                chromosome.set_fitness(f);
            }
        }
        Ok(())
    }
}

fn worker_lost(pending: usize) -> EvolveError {
    EvolveError::WorkerPool(format!("{} fitness jobs ended without reporting a result", pending))
}

/// how fitness jobs are scheduled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EvaluationMode {
    Synchronous,
    Parallel {
        /// 0 = one per core
        workers: usize,
        /// barrier deadline per generation, None waits forever
        timeout_ms: Option<u64>,
    },
}

impl Default for EvaluationMode {
    fn default() -> Self {
        EvaluationMode::Synchronous
    }
}

impl EvaluationMode {
    pub fn build(&self) -> Result<Box<dyn FitnessEvaluator>> {
        match *self {
            EvaluationMode::Synchronous => Ok(Box::new(SyncEvaluator)),
            EvaluationMode::Parallel { workers, timeout_ms } => {
                let pool = PoolEvaluator::new(workers, timeout_ms.map(Duration::from_millis))?;
                log::info!("parallel fitness evaluation on {} workers", pool.workers());
                Ok(Box::new(pool))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dna::GeneEncoding;
    use crate::fitness::{DifferenceMetric, PerceptualMetric};
    use crate::render::CpuRenderer;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct SlowRasterizer(Duration);

    impl Rasterizer for SlowRasterizer {
        fn rasterize(&self, _c: &Chromosome, width: u32, height: u32, _ratio: f32) -> Vec<u8> {
            std::thread::sleep(self.0);
            vec![0; (width * height * 4) as usize]
        }
    }

    struct PanickingRasterizer;

    impl Rasterizer for PanickingRasterizer {
        fn rasterize(&self, _c: &Chromosome, _w: u32, _h: u32, _ratio: f32) -> Vec<u8> {
            panic!("rasterizer exploded");
        }
    }

    struct NanMetric;

    impl FitnessMetric for NanMetric {
        fn score(&self, _r: &[u8], _c: &[u8]) -> f64 {
            f64::NAN
        }

        fn name(&self) -> &'static str {
            "nan"
        }
    }

    fn context(rasterizer: Arc<dyn Rasterizer>, metric: Arc<dyn FitnessMetric>) -> Arc<EvaluationContext> {
        let reference = ReferenceImage::filled(16, 12, [40, 80, 120, 255]).unwrap();
        Arc::new(EvaluationContext { reference: Arc::new(reference), ratio: 0.5, rasterizer, metric })
    }

    fn population(n: usize, seed: u64) -> Vec<Chromosome> {
        let mut rng = Pcg32::seed_from_u64(seed);
        (0..n).map(|_| Chromosome::random(12, GeneEncoding::Circle, &mut rng)).collect()
    }

    #[test]
    fn test_pool_matches_sync() {
        let ctx = context(Arc::new(CpuRenderer::default()), Arc::new(PerceptualMetric { stride: 1 }));
        let mut a = population(24, 3);
        let mut b = a.clone();

        SyncEvaluator.evaluate(&mut a, &ctx).unwrap();
        PoolEvaluator::new(4, None).unwrap().evaluate(&mut b, &ctx).unwrap();

        for (x, y) in a.iter().zip(&b) {
            assert!(x.fitness().is_some());
            assert_eq!(x.fitness(), y.fitness());
        }
    }

    #[test]
    fn test_pool_timeout_is_surfaced() {
        let ctx = context(Arc::new(SlowRasterizer(Duration::from_millis(300))), Arc::new(DifferenceMetric));
        let mut pop = population(4, 4);
        let evaluator = PoolEvaluator::new(2, Some(Duration::from_millis(20))).unwrap();
        let err = evaluator.evaluate(&mut pop, &ctx).unwrap_err();
        assert!(matches!(err, EvolveError::ConcurrencyTimeout { total: 4, .. }));
    }

    #[test]
    fn test_pool_worker_panic_is_surfaced() {
        let ctx = context(Arc::new(PanickingRasterizer), Arc::new(DifferenceMetric));
        let mut pop = population(3, 5);
        let evaluator = PoolEvaluator::new(2, Some(Duration::from_secs(5))).unwrap();
        let err = evaluator.evaluate(&mut pop, &ctx).unwrap_err();
        assert!(matches!(err, EvolveError::WorkerPool(_)));
    }

    #[test]
    fn test_degenerate_metric_scores_zero() {
        let ctx = context(Arc::new(CpuRenderer::default()), Arc::new(NanMetric));
        let mut pop = population(3, 6);
        SyncEvaluator.evaluate(&mut pop, &ctx).unwrap();
        assert!(pop.iter().all(|c| c.fitness() == Some(0.0)));
    }

    #[test]
    fn test_self_reference_scores_one() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut c = Chromosome::random(20, GeneEncoding::Circle, &mut rng);
        let renderer = Arc::new(CpuRenderer::default());
        let rgba = renderer.rasterize(&c, 30, 20, 1.0);
        let ctx = EvaluationContext {
            reference: Arc::new(ReferenceImage::new(rgba, 30, 20).unwrap()),
            ratio: 1.0,
            rasterizer: renderer,
            metric: Arc::new(PerceptualMetric { stride: 1 }),
        };
        assert_eq!(c.compute_fitness(&ctx), 1.0);
        assert_eq!(c.fitness(), Some(1.0));
    }

    #[test]
    fn test_empty_chromosome_difference_against_black_and_white() {
        // no circles: the renderer leaves the opaque black canvas
        let mut c = Chromosome::from_circles(Vec::new(), GeneEncoding::Circle);
        for (fill, expected) in [([0, 0, 0, 255], 1.0), ([255, 255, 255, 255], -2.0)] {
            let ctx = EvaluationContext {
                reference: Arc::new(ReferenceImage::filled(12, 8, fill).unwrap()),
                ratio: 1.0,
                rasterizer: Arc::new(CpuRenderer::default()),
                metric: Arc::new(DifferenceMetric),
            };
            assert_eq!(c.compute_fitness(&ctx), expected);
            assert_eq!(c.fitness(), Some(expected));
        }
    }

    #[test]
    fn test_mode_serde_and_build() {
        let mode: EvaluationMode =
            serde_json::from_str(r#"{"mode":"parallel","workers":2,"timeout_ms":1000}"#).unwrap();
        assert_eq!(mode, EvaluationMode::Parallel { workers: 2, timeout_ms: Some(1000) });
        assert!(mode.build().is_ok());
        assert!(EvaluationMode::default().build().is_ok());
        assert_eq!(PoolEvaluator::new(2, None).unwrap().workers(), 2);
    }
}
