use rand::Rng;

use crate::dna::Chromosome;
use crate::settings::ParentSelection;

use super::Engine;

/// roulette weight: negative scores never get a slice of the wheel
#[inline]
fn weight(c: &Chromosome) -> f64 {
    c.fitness().unwrap_or(0.0).max(0.0)
}

impl Engine {
    /// sort best-first and refresh the elite roulette sum.
    /// the sort is stable, so equal scores keep their previous slot order
    pub(super) fn make_selection(&mut self) {
        profiling::scope!("make_selection");
        self.population.sort_by(|a, b| {
            let fa = a.fitness().unwrap_or(0.0);
            let fb = b.fitness().unwrap_or(0.0);
            fb.total_cmp(&fa)
        });

        self.sum_fitness = self.population[..self.elite_count].iter().map(weight).sum();
        self.state.best_fitness = self.population[0].fitness().unwrap_or(0.0);
    }

    /// elite prefix, parents of the next generation
    #[inline]
    pub fn best_chromosomes(&self) -> &[Chromosome] {
        &self.population[..self.elite_count]
    }

    /// slots that crossover overwrites
    #[inline]
    pub fn worst_chromosomes(&self) -> &[Chromosome] {
        &self.population[self.elite_count..]
    }

    #[inline]
    pub fn elite_count(&self) -> usize {
        self.elite_count
    }

    #[inline]
    pub fn sum_fitness(&self) -> f64 {
        self.sum_fitness
    }
}

/// draw two parent indices from the elite slice. distinct whenever there is
/// more than one elite; a single elite is paired with itself
pub(super) fn pick_parents<R: Rng + ?Sized>(
    elites: &[Chromosome],
    sum_fitness: f64,
    mode: ParentSelection,
    rng: &mut R,
) -> (usize, usize) {
    if elites.len() == 1 {
        return (0, 0);
    }
    match mode {
        ParentSelection::Uniform => {
            let a = rng.random_range(0..elites.len());
            // shift past `a` so b is uniform over the rest
            let mut b = rng.random_range(0..elites.len() - 1);
            if b >= a {
                b += 1;
            }
            (a, b)
        }
        ParentSelection::Roulette => {
            let a = spin(elites, sum_fitness, None, rng);
            let rest = sum_fitness - weight(&elites[a]);
            let b = spin(elites, rest, Some(a), rng);
            (a, b)
        }
    }
}

/// fitness-proportionate draw, optionally excluding one slot.
/// falls back to uniform when the wheel has no weight left
fn spin<R: Rng + ?Sized>(elites: &[Chromosome], total: f64, skip: Option<usize>, rng: &mut R) -> usize {
    if total > 0.0 {
        let mut ball = rng.random::<f64>() * total;
        let mut last = None;
        for (idx, c) in elites.iter().enumerate() {
            let w = weight(c);
            if Some(idx) == skip || w <= 0.0 {
                continue;
            }
            last = Some(idx);
            if ball < w {
                return idx;
            }
            ball -= w;
        }
        // float drift past the end of the wheel
        if let Some(idx) = last {
            return idx;
        }
    }

    let candidates = elites.len() - usize::from(skip.is_some());
    let mut idx = rng.random_range(0..candidates);
    if let Some(s) = skip {
        if idx >= s {
            idx += 1;
        }
    }
    idx
}
