use std::sync::Arc;

use crate::dna::Chromosome;
use crate::fitness::FitnessMetric;

use super::Engine;

/// elitist rollback: remembers the population at the best compliance seen so
/// far and puts it back when a generation scores worse
pub struct ComplianceGuard {
    metric: Arc<dyn FitnessMetric>,
    snapshot: Option<Vec<Chromosome>>, // sorted, with cached fitness
}

impl ComplianceGuard {
    pub fn new(metric: Arc<dyn FitnessMetric>) -> Self {
        Self { metric, snapshot: None }
    }

    pub fn snapshot(&self) -> Option<&[Chromosome]> {
        self.snapshot.as_deref()
    }

    pub fn clear(&mut self) {
        self.snapshot = None;
    }

    fn store(&mut self, population: &[Chromosome]) {
        match self.snapshot.as_mut() {
            // reuse the per-slot allocations
            Some(snap) if snap.len() == population.len() => snap.clone_from_slice(population),
            _ => self.snapshot = Some(population.to_vec()),
        }
    }
}

impl Engine {
    /// score the current best with the compliance metric. a regression restores the
    /// saved population and reselects from it; returns whether that happened
    pub(super) fn apply_rollback(&mut self) -> bool {
        profiling::scope!("apply_rollback");
        let Some(guard) = self.guard.as_mut() else {
            self.state.compliance = self.state.best_fitness;
            return false;
        };

        let compliance = self.context.score_with(&self.population[0], guard.metric.as_ref());
        let first = self.state.generation == 1 || guard.snapshot.is_none();
        if first || compliance >= self.state.compliance {
            self.state.compliance = compliance;
            guard.store(&self.population);
            return false;
        }

        let Some(snapshot) = guard.snapshot.as_deref() else {
            return false;
        };
        log::warn!(
            "generation {}: compliance {:.5} < {:.5}, restoring best population",
            self.state.generation,
            compliance,
            self.state.compliance
        );
        self.population.clone_from_slice(snapshot);
        self.make_selection();
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::engine::test_support::*;
    use crate::settings::{ComplianceSettings, RunSettings};

    /// replays a fixed compliance sequence, repeating the last value
    struct ScriptedMetric {
        values: Vec<f64>,
        calls: AtomicUsize,
    }

    impl FitnessMetric for ScriptedMetric {
        fn score(&self, _reference: &[u8], _candidate: &[u8]) -> f64 {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            self.values[i.min(self.values.len() - 1)]
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn guarded_engine(values: Vec<f64>) -> Engine {
        let settings = RunSettings {
            compliance: ComplianceSettings { enabled: true, ..Default::default() },
            ..small_settings()
        };
        Engine::builder()
            .compliance_metric(Arc::new(ScriptedMetric { values, calls: AtomicUsize::new(0) }))
            .build(gradient_reference(32, 24), settings)
            .unwrap()
    }

    #[test]
    fn test_regression_restores_snapshot() {
        let mut engine = guarded_engine(vec![0.5, 0.3]);

        let first = engine.step().unwrap();
        assert!(!first.report.rolled_back);
        assert_eq!(engine.state().compliance, 0.5);
        let saved = engine.best_iteration_so_far().unwrap().to_vec();

        let second = engine.step().unwrap();
        assert!(second.report.rolled_back);
        assert_eq!(second.report.compliance, 0.5);
        assert_eq!(engine.best_iteration_so_far().unwrap(), &saved[..]);
        // selection reran on the restored population
        assert_eq!(Some(second.report.best_fitness), saved[0].fitness());
    }

    #[test]
    fn test_improvement_replaces_snapshot() {
        let mut engine = guarded_engine(vec![0.2, 0.4, 0.4]);
        engine.step().unwrap();
        engine.step().unwrap();
        assert_eq!(engine.state().compliance, 0.4);

        // equal compliance still adopts the new population
        let third = engine.step().unwrap();
        assert!(!third.report.rolled_back);
        assert_eq!(engine.best_iteration_so_far().unwrap()[0].fitness(), Some(third.report.best_fitness));
    }

    #[test]
    fn test_compliance_never_decreases() {
        let mut engine = guarded_engine(vec![0.3, 0.6, 0.1, 0.5, 0.7, 0.2]);
        let mut last = f64::MIN;
        for _ in 0..6 {
            let r = engine.step().unwrap().report;
            assert!(r.compliance >= last);
            last = r.compliance;
        }
        assert_eq!(last, 0.7);
    }

    #[test]
    fn test_disabled_guard_tracks_best_fitness() {
        let mut engine = Engine::new(gradient_reference(32, 24), small_settings()).unwrap();
        let r = engine.step().unwrap().report;
        assert!(!r.rolled_back);
        assert_eq!(r.compliance, r.best_fitness);
        assert!(engine.best_iteration_so_far().is_none());
    }

    #[test]
    fn test_reset_drops_snapshot() {
        let mut engine = guarded_engine(vec![0.5]);
        engine.step().unwrap();
        assert!(engine.best_iteration_so_far().is_some());
        engine.reset();
        assert!(engine.best_iteration_so_far().is_none());
    }
}
