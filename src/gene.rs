use rand::Rng;
use serde::{Deserialize, Serialize};

/// scalar genes needed to describe one circle: x, y, radius, r, g, b, a
pub const CIRCLE_ATTRIBUTES: usize = 7;

/// a single evolvable parameter, always in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gene(f32);

impl Gene {
    #[inline]
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.random::<f32>())
    }

    /// wrap an existing value. out-of-range values are clamped, NaN becomes 0
    #[inline]
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    #[inline]
    pub fn value(self) -> f32 {
        self.0
    }
}

/// one translucent circle. every attribute is normalized, the rasterizer maps
/// position to canvas pixels and radius to the configured pixel range.
/// never modified in place: mutation swaps in a new value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircleGene {
    x: Gene,
    y: Gene,
    radius: Gene,
    r: Gene,
    g: Gene,
    b: Gene,
    a: Gene,
}

impl CircleGene {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            x: Gene::random(rng),
            y: Gene::random(rng),
            radius: Gene::random(rng),
            r: Gene::random(rng),
            g: Gene::random(rng),
            b: Gene::random(rng),
            a: Gene::random(rng),
        }
    }

    pub fn from_values(v: [f32; CIRCLE_ATTRIBUTES]) -> Self {
        Self {
            x: Gene::new(v[0]),
            y: Gene::new(v[1]),
            radius: Gene::new(v[2]),
            r: Gene::new(v[3]),
            g: Gene::new(v[4]),
            b: Gene::new(v[5]),
            a: Gene::new(v[6]),
        }
    }

    /// attribute order matches `from_values`
    pub fn values(&self) -> [f32; CIRCLE_ATTRIBUTES] {
        [
            self.x.value(),
            self.y.value(),
            self.radius.value(),
            self.r.value(),
            self.g.value(),
            self.b.value(),
            self.a.value(),
        ]
    }

    /// copy of this circle with a single attribute replaced (scalar-encoding mutation)
    pub fn with_attribute(&self, attribute: usize, gene: Gene) -> Self {
        let mut v = self.values();
        if let Some(slot) = v.get_mut(attribute) {
            *slot = gene.value();
        }
        Self::from_values(v)
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.x.value()
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.y.value()
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius.value()
    }

    /// straight (un-premultiplied) color, 0..1
    #[inline]
    pub fn rgba(&self) -> [f32; 4] {
        [self.r.value(), self.g.value(), self.b.value(), self.a.value()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_random_genes_in_unit_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..1000 {
            let c = CircleGene::random(&mut rng);
            assert!(c.values().iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_new_clamps_and_rejects_nan() {
        assert_eq!(Gene::new(1.5).value(), 1.0);
        assert_eq!(Gene::new(-0.2).value(), 0.0);
        assert_eq!(Gene::new(f32::NAN).value(), 0.0);
        assert_eq!(Gene::new(0.25).value(), 0.25);
    }

    #[test]
    fn test_with_attribute_replaces_only_one_field() {
        let c = CircleGene::from_values([0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]);
        let m = c.with_attribute(2, Gene::new(0.9));
        assert_eq!(m.values(), [0.1, 0.2, 0.9, 0.4, 0.5, 0.6, 0.7]);
        // source circle untouched
        assert_eq!(c.radius(), 0.3);
        // out-of-range attribute index is a no-op
        assert_eq!(c.with_attribute(CIRCLE_ATTRIBUTES, Gene::new(0.0)), c);
    }
}
