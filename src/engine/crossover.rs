use rand::Rng;

use crate::error::Result;
use crate::settings::CrossoverKind;

use super::selection::pick_parents;
use super::Engine;

impl Engine {
    /// refill every non-elite slot with a child of two elites, in place
    pub(super) fn make_crossover(&mut self) -> Result<()> {
        profiling::scope!("make_crossover");
        let (elites, worst) = self.population.split_at_mut(self.elite_count);
        let kind = self.settings.crossover;
        let mode = self.settings.parent_selection;

        for slot in worst.iter_mut() {
            let (a, b) = pick_parents(elites, self.sum_fitness, mode, &mut self.rng);
            let parent_a = elites[a].genes_array();
            let parent_b = elites[b].genes_array();
            let stride = elites[a].encoding().stride();
            let child = splice(&parent_a, &parent_b, kind, stride, &mut self.rng);
            slot.set_genes(&child)?;
        }
        Ok(())
    }
}

/// child genome from two flat parent arrays. cut points only land on gene
/// boundaries (multiples of `stride`)
pub fn splice<R: Rng + ?Sized>(a: &[f32], b: &[f32], kind: CrossoverKind, stride: usize, rng: &mut R) -> Vec<f32> {
    debug_assert_eq!(a.len(), b.len());
    let genes = a.len() / stride.max(1);
    if genes == 0 {
        return a.to_vec();
    }

    let mut child = Vec::with_capacity(a.len());
    match kind {
        // needs room for a non-empty middle section
        CrossoverKind::TwoPoint if genes >= 3 => {
            let k1 = rng.random_range(1..genes - 1) * stride;
            let k2 = rng.random_range(k1 / stride + 1..genes) * stride;
            child.extend_from_slice(&a[..k1]);
            child.extend_from_slice(&b[k1..k2]);
            child.extend_from_slice(&a[k2..]);
        }
        _ => {
            let k = rng.random_range(0..genes) * stride;
            child.extend_from_slice(&a[..k]);
            child.extend_from_slice(&b[k..]);
        }
    }
    child
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dna::GeneEncoding;
    use crate::engine::test_support::*;
    use crate::settings::RunSettings;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn parents(len: usize) -> (Vec<f32>, Vec<f32>) {
        (vec![0.0; len], vec![1.0; len])
    }

    #[test]
    fn test_single_point_is_prefix_then_suffix() {
        let (a, b) = parents(21);
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..100 {
            let child = splice(&a, &b, CrossoverKind::SinglePoint, 7, &mut rng);
            assert_eq!(child.len(), 21);
            let k = child.iter().position(|&v| v == 1.0).unwrap_or(21);
            assert_eq!(k % 7, 0);
            assert!(child[..k].iter().all(|&v| v == 0.0));
            assert!(child[k..].iter().all(|&v| v == 1.0));
        }
    }

    #[test]
    fn test_two_point_takes_middle_from_b() {
        let (a, b) = parents(5);
        let mut rng = Pcg32::seed_from_u64(2);
        for _ in 0..100 {
            let child = splice(&a, &b, CrossoverKind::TwoPoint, 1, &mut rng);
            let k1 = child.iter().position(|&v| v == 1.0).unwrap();
            let k2 = child.iter().rposition(|&v| v == 1.0).unwrap() + 1;
            assert!(k1 >= 1 && k1 < k2);
            assert!(child[..k1].iter().all(|&v| v == 0.0));
            assert!(child[k1..k2].iter().all(|&v| v == 1.0));
            assert!(child[k2..].iter().all(|&v| v == 0.0));
            // a always contributes a tail
            assert!(k2 < 5);
        }
    }

    #[test]
    fn test_two_point_short_genome_uses_single_point() {
        let (a, b) = parents(2);
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..50 {
            let child = splice(&a, &b, CrossoverKind::TwoPoint, 1, &mut rng);
            // single cut: never a trailing a-section
            assert_eq!(child[1], 1.0);
        }
    }

    #[test]
    fn test_children_only_come_from_elites() {
        let settings = RunSettings {
            population_size: 6,
            circles: 4,
            selection_rate: 0.5,
            gene_encoding: GeneEncoding::Circle,
            ..small_settings()
        };
        let mut engine = Engine::new(gradient_reference(16, 12), settings).unwrap();
        engine.evaluator.evaluate(&mut engine.population, &engine.context).unwrap();
        engine.make_selection();
        let elites = engine.best_chromosomes().to_vec();

        engine.make_crossover().unwrap();
        assert_eq!(engine.best_chromosomes(), &elites[..]);
        for child in engine.worst_chromosomes() {
            assert_eq!(child.fitness(), None);
            for (i, circle) in child.circles().iter().enumerate() {
                assert!(elites.iter().any(|e| e.circles()[i] == *circle));
            }
        }
    }
}
