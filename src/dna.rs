use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EvolveError, Result};
use crate::evaluator::EvaluationContext;
use crate::gene::{CircleGene, Gene, CIRCLE_ATTRIBUTES};

/// how the genome is cut into genes for crossover and mutation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneEncoding {
    /// one gene per circle: splices and mutations move whole circles
    Circle,
    /// flat parameter vector: seven scalar genes per circle
    Scalar,
}

impl GeneEncoding {
    /// flat values per gene
    #[inline]
    pub fn stride(self) -> usize {
        match self {
            GeneEncoding::Circle => CIRCLE_ATTRIBUTES,
            GeneEncoding::Scalar => 1,
        }
    }
}

/// a candidate image: circles painted in order, later ones over earlier ones.
/// fitness is cached and only meaningful after the most recent `compute_fitness`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    circles: Vec<CircleGene>,
    encoding: GeneEncoding,

    #[serde(skip)]
    fitness: Option<f64>,
}

impl Chromosome {
    pub fn random<R: Rng + ?Sized>(circles: usize, encoding: GeneEncoding, rng: &mut R) -> Self {
        profiling::scope!("Chromosome::random");
        Self {
            circles: (0..circles).map(|_| CircleGene::random(rng)).collect(),
            encoding,
            fitness: None,
        }
    }

    pub fn from_circles(circles: Vec<CircleGene>, encoding: GeneEncoding) -> Self {
        Self { circles, encoding, fitness: None }
    }

    /// build a genome of `circles` circles from a flat value array (seven values per circle)
    pub fn from_values(values: &[f32], circles: usize, encoding: GeneEncoding) -> Result<Self> {
        let expected = circles * CIRCLE_ATTRIBUTES;
        if values.len() != expected {
            return Err(EvolveError::GenomeLengthMismatch { expected, actual: values.len() });
        }
        Ok(Self::from_circles(unflatten(values), encoding))
    }

    #[inline]
    pub fn encoding(&self) -> GeneEncoding {
        self.encoding
    }

    /// genome length in genes for the active encoding
    #[inline]
    pub fn len(&self) -> usize {
        match self.encoding {
            GeneEncoding::Circle => self.circles.len(),
            GeneEncoding::Scalar => self.circles.len() * CIRCLE_ATTRIBUTES,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }

    #[inline]
    pub fn circles(&self) -> &[CircleGene] {
        &self.circles
    }

    /// flat snapshot of every gene value, owned by the caller
    pub fn genes_array(&self) -> Vec<f32> {
        self.circles.iter().flat_map(|c| c.values()).collect()
    }

    /// overwrite the genome in place with a flat value array of the same length.
    /// used by crossover to reuse population slots across generations.
    pub fn set_genes(&mut self, values: &[f32]) -> Result<()> {
        let expected = self.circles.len() * CIRCLE_ATTRIBUTES;
        if values.len() != expected {
            return Err(EvolveError::GenomeLengthMismatch { expected, actual: values.len() });
        }
        for (slot, chunk) in self.circles.iter_mut().zip(values.chunks_exact(CIRCLE_ATTRIBUTES)) {
            *slot = circle_from_chunk(chunk);
        }
        self.fitness = None;
        Ok(())
    }

    /// with probability `mutation_rate`, re-randomize exactly one gene.
    /// returns whether a gene was replaced (cached fitness is then invalid)
    pub fn mutate<R: Rng + ?Sized>(&mut self, mutation_rate: f64, rng: &mut R) -> bool {
        if self.circles.is_empty() || rng.random::<f64>() >= mutation_rate {
            return false;
        }
        let idx = rng.random_range(0..self.len());
        match self.encoding {
            GeneEncoding::Circle => {
                self.circles[idx] = CircleGene::random(rng);
            }
            GeneEncoding::Scalar => {
                let circle = idx / CIRCLE_ATTRIBUTES;
                let attribute = idx % CIRCLE_ATTRIBUTES;
                self.circles[circle] = self.circles[circle].with_attribute(attribute, Gene::random(rng));
            }
        }
        self.fitness = None;
        true
    }

    /// rasterize against the context's reference and cache the score
    pub fn compute_fitness(&mut self, ctx: &EvaluationContext) -> f64 {
        let fitness = ctx.score(self);
        self.fitness = Some(fitness);
        fitness
    }

    /// cached score, None until evaluated (or after a mutation / splice)
    #[inline]
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    #[inline]
    pub(crate) fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }
}

#[inline]
fn circle_from_chunk(chunk: &[f32]) -> CircleGene {
    let mut v = [0.0f32; CIRCLE_ATTRIBUTES];
    v.copy_from_slice(chunk);
    CircleGene::from_values(v)
}

fn unflatten(values: &[f32]) -> Vec<CircleGene> {
    values.chunks_exact(CIRCLE_ATTRIBUTES).map(circle_from_chunk).collect()
}
