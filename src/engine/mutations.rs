use super::Engine;

impl Engine {
    /// give every chromosome one chance at a single-gene re-roll.
    /// elites are skipped when `mutate_elites` is off. returns how many changed
    pub(super) fn make_mutation(&mut self) -> usize {
        profiling::scope!("make_mutation");
        let start = if self.settings.mutate_elites { 0 } else { self.elite_count };
        let rate = self.settings.mutation_rate;

        let mut mutated = 0;
        for chromosome in self.population[start..].iter_mut() {
            if chromosome.mutate(rate, &mut self.rng) {
                mutated += 1;
            }
        }
        log::trace!("generation {}: {} chromosomes mutated", self.state.generation, mutated);
        mutated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::*;
    use crate::settings::RunSettings;

    #[test]
    fn test_zero_rate_only_reshuffles_initial_genes() {
        let settings = RunSettings { mutation_rate: 0.0, max_generation: 6, ..small_settings() };
        let mut engine = Engine::new(gradient_reference(32, 24), settings).unwrap();
        let initial = engine.population().to_vec();

        while !engine.is_finished() {
            engine.step().unwrap();
        }
        // without mutation every circle at position i came from some initial chromosome's circle i
        for c in engine.population() {
            for (i, circle) in c.circles().iter().enumerate() {
                assert!(initial.iter().any(|p| p.circles()[i] == *circle));
            }
        }
    }

    #[test]
    fn test_full_rate_mutates_every_slot() {
        let settings = RunSettings { mutation_rate: 1.0, ..small_settings() };
        let mut engine = Engine::new(gradient_reference(16, 12), settings).unwrap();
        assert_eq!(engine.make_mutation(), 8);
    }

    #[test]
    fn test_elites_protected_when_configured() {
        let settings = RunSettings { mutation_rate: 1.0, mutate_elites: false, ..small_settings() };
        let mut engine = Engine::new(gradient_reference(16, 12), settings).unwrap();
        let elites = engine.best_chromosomes().to_vec();
        assert_eq!(engine.make_mutation(), 8 - engine.elite_count());
        assert_eq!(engine.best_chromosomes(), &elites[..]);
    }
}
