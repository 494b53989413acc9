use crate::app_types::{GenerationReport, RunPhase};

use super::Engine;

impl Engine {
    /// lifecycle derived from the generation counters
    pub fn phase(&self) -> RunPhase {
        if self.is_finished() {
            RunPhase::Done
        } else if self.state.generation == 0 {
            RunPhase::Idle
        } else {
            RunPhase::Running
        }
    }

    /// snapshot of the counters for observers and the engine thread
    pub fn report(&self, rolled_back: bool) -> GenerationReport {
        GenerationReport {
            generation: self.state.generation,
            max_generation: self.state.max_generation,
            best_fitness: self.state.best_fitness,
            compliance: self.state.compliance,
            rolled_back,
            finished: self.is_finished(),
        }
    }

    /// mean cached fitness of the elite slice, 0 before the first generation
    pub fn mean_elite_fitness(&self) -> f64 {
        let scored: Vec<f64> = self.best_chromosomes().iter().filter_map(|c| c.fitness()).collect();
        if scored.is_empty() {
            return 0.0;
        }
        scored.iter().sum::<f64>() / scored.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::*;

    #[test]
    fn test_report_follows_state() {
        let mut engine = Engine::new(gradient_reference(16, 12), small_settings()).unwrap();
        let idle = engine.report(false);
        assert_eq!((idle.generation, idle.max_generation, idle.finished), (0, 10, false));
        assert_eq!(engine.mean_elite_fitness(), 0.0);

        let step = engine.step().unwrap();
        assert_eq!(step.report, engine.report(false));
        assert_eq!(engine.phase(), RunPhase::Running);
        assert!(engine.mean_elite_fitness() <= step.report.best_fitness);
    }
}
