//─────────────────────────────────────────────────────────────────────────────
// fitness metrics: reference RGBA vs candidate RGBA -> scalar, higher is better
//─────────────────────────────────────────────────────────────────────────────

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::color::{compare_color, compare_color_squared, compare_color_strict};
use super::sad::sad_rgba;

/// a swappable similarity score between two equally sized RGBA buffers
pub trait FitnessMetric: Send + Sync {
    fn score(&self, reference: &[u8], candidate: &[u8]) -> f64;

    fn name(&self) -> &'static str;
}

/// a degenerate score (NaN, ±inf) would poison every later sort, so it becomes 0
#[inline]
pub fn sanitize_score(score: f64) -> f64 {
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// mean of `compare` over every `stride`-th pixel. no samples -> 0
fn sampled_mean<F>(reference: &[u8], candidate: &[u8], stride: usize, compare: F) -> f64
where
    F: Fn(&[u8], &[u8]) -> f64,
{
    let (sum, count) = reference
        .chunks_exact(4)
        .zip(candidate.chunks_exact(4))
        .step_by(stride.max(1))
        .fold((0.0f64, 0usize), |(sum, count), (r, c)| (sum + compare(r, c), count + 1));

    if count == 0 {
        return 0.0;
    }
    sanitize_score(sum / count as f64)
}

/// euclidean RGB similarity averaged over sampled pixels, in [0, 1]
#[derive(Clone, Copy, Debug)]
pub struct PerceptualMetric {
    pub stride: usize,
}

impl FitnessMetric for PerceptualMetric {
    fn score(&self, reference: &[u8], candidate: &[u8]) -> f64 {
        profiling::scope!("PerceptualMetric::score");
        sampled_mean(reference, candidate, self.stride, |r, c| {
            compare_color(r[0], r[1], r[2], c[0], c[1], c[2])
        })
    }

    fn name(&self) -> &'static str {
        "perceptual"
    }
}

/// `1 - SAD / (pixels * 255)` over the whole buffer, alpha included.
/// cheap, unbounded below (all-white vs all-black scores -2)
#[derive(Clone, Copy, Debug, Default)]
pub struct DifferenceMetric;

impl FitnessMetric for DifferenceMetric {
    fn score(&self, reference: &[u8], candidate: &[u8]) -> f64 {
        profiling::scope!("DifferenceMetric::score");
        let pixels = reference.len().min(candidate.len()) / 4;
        if pixels == 0 {
            return 0.0;
        }
        let bytes = pixels * 4;
        let sad = sad_rgba(&reference[..bytes], &candidate[..bytes]);
        sanitize_score(1.0 - sad as f64 / (pixels as f64 * 255.0))
    }

    fn name(&self) -> &'static str {
        "difference"
    }
}

/// per-channel averaged similarity over sampled pixels, in [0, 1]
#[derive(Clone, Copy, Debug)]
pub struct StrictMetric {
    pub stride: usize,
}

impl FitnessMetric for StrictMetric {
    fn score(&self, reference: &[u8], candidate: &[u8]) -> f64 {
        profiling::scope!("StrictMetric::score");
        sampled_mean(reference, candidate, self.stride, |r, c| {
            compare_color_strict(r[0], r[1], r[2], c[0], c[1], c[2])
        })
    }

    fn name(&self) -> &'static str {
        "strict"
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SquaredMetric {
    pub stride: usize,
}

impl FitnessMetric for SquaredMetric {
    fn score(&self, reference: &[u8], candidate: &[u8]) -> f64 {
        profiling::scope!("SquaredMetric::score");
        sampled_mean(reference, candidate, self.stride, |r, c| {
            compare_color_squared(r[0], r[1], r[2], c[0], c[1], c[2])
        })
    }

    fn name(&self) -> &'static str {
        "squared"
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Perceptual,
    Difference,
    Strict,
    Squared,
}

/// metric choice plus pixel sampling stride (ignored by `Difference`)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSettings {
    pub kind: MetricKind,
    pub stride: usize,
}

impl MetricSettings {
    pub const fn new(kind: MetricKind, stride: usize) -> Self {
        Self { kind, stride }
    }

    pub fn build(&self) -> Arc<dyn FitnessMetric> {
        let stride = self.stride.max(1);
        match self.kind {
            MetricKind::Perceptual => Arc::new(PerceptualMetric { stride }),
            MetricKind::Difference => Arc::new(DifferenceMetric),
            MetricKind::Strict => Arc::new(StrictMetric { stride }),
            MetricKind::Squared => Arc::new(SquaredMetric { stride }),
        }
    }
}
