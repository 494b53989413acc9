use serde::{Deserialize, Serialize};
use tiny_skia as sk;

use crate::dna::Chromosome;
use crate::gene::CircleGene;

/// turns a chromosome into straight RGBA pixels (row-major, width * height * 4).
/// implementations must paint circles in genome order with straight alpha
/// blending and be deterministic for identical input.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, chromosome: &Chromosome, width: u32, height: u32, scale_ratio: f32) -> Vec<u8>;
}

/// pixel radius range at display resolution (10..25 px by default)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadiusRange {
    pub min: f32,
    pub max: f32,
}

impl Default for RadiusRange {
    fn default() -> Self {
        Self { min: 10.0, max: 25.0 }
    }
}

impl RadiusRange {
    /// normalized gene -> whole pixels at display resolution
    #[inline]
    pub fn pixels(&self, gene: f32) -> f32 {
        (gene * (self.max - self.min) + self.min).round()
    }
}

// scratch pixmap reused across calls on the same thread (pool workers included)
thread_local! {
    static SCRATCH_PIX: std::cell::RefCell<Option<sk::Pixmap>> =
        const { std::cell::RefCell::new(None) };
}

/// tiny-skia software rasterizer on an opaque black canvas
#[derive(Clone, Debug)]
pub struct CpuRenderer {
    pub radius: RadiusRange,
    pub antialias: bool,
}

impl Default for CpuRenderer {
    fn default() -> Self {
        Self { radius: RadiusRange::default(), antialias: true }
    }
}

impl CpuRenderer {
    pub fn new(radius: RadiusRange, antialias: bool) -> Self {
        Self { radius, antialias }
    }

    fn draw_circle(&self, pix: &mut sk::Pixmap, circle: &CircleGene, scale_ratio: f32) {
        profiling::scope!("draw_circle");
        let (w, h) = (pix.width() as f32, pix.height() as f32);
        let cx = circle.x() * w;
        let cy = circle.y() * h;
        let radius = self.radius.pixels(circle.radius()) * scale_ratio;
        if !(radius > 0.0) {
            return;
        }

        // fully off-canvas: nothing to clip, skip tiny-skia work
        if cx + radius < 0.0 || cy + radius < 0.0 || cx - radius >= w || cy - radius >= h {
            return;
        }

        let Some(path) = sk::PathBuilder::from_circle(cx, cy, radius) else {
            return;
        };
        let [r, g, b, a] = circle.rgba();
        let Some(color) = sk::Color::from_rgba(r, g, b, a) else {
            return;
        };

        let mut paint = sk::Paint::default();
        paint.anti_alias = self.antialias;
        paint.set_color(color);
        pix.fill_path(&path, &paint, sk::FillRule::Winding, sk::Transform::identity(), None);
    }
}

impl Rasterizer for CpuRenderer {
    fn rasterize(&self, chromosome: &Chromosome, width: u32, height: u32, scale_ratio: f32) -> Vec<u8> {
        profiling::scope!("CpuRenderer::rasterize");
        SCRATCH_PIX.with(|cell| {
            let mut slot = cell.borrow_mut();
            let need_new = match slot.as_ref() {
                Some(pm) => pm.width() != width || pm.height() != height,
                None => true,
            };
            if need_new {
                // None for zero-area canvases
                *slot = sk::Pixmap::new(width, height);
            }
            let Some(pix) = slot.as_mut() else {
                return Vec::new();
            };

            pix.fill(sk::Color::BLACK);
            for circle in chromosome.circles() {
                self.draw_circle(pix, circle, scale_ratio);
            }
            demultiply(pix)
        })
    }
}

/// tiny-skia keeps premultiplied pixels; callers compare straight RGBA
fn demultiply(pix: &sk::Pixmap) -> Vec<u8> {
    profiling::scope!("demultiply");
    let mut out = Vec::with_capacity(pix.data().len());
    for px in pix.pixels() {
        let c = px.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}
