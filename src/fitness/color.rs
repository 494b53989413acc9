//! per-pixel color similarity. every function returns 1.0 for identical colors
//! and decreases towards 0.0 as the colors drift apart.

/// √(255² · 3), the largest possible euclidean RGB distance
pub const MAX_RGB_DISTANCE: f64 = 441.672_955_930_063_7;

/// euclidean RGB distance normalized to [0, 1], reported as similarity
#[inline]
pub fn compare_color(r1: u8, g1: u8, b1: u8, r2: u8, g2: u8, b2: u8) -> f64 {
    let dr = r1 as f64 - r2 as f64;
    let dg = g1 as f64 - g2 as f64;
    let db = b1 as f64 - b2 as f64;
    1.0 - (dr * dr + dg * dg + db * db).sqrt() / MAX_RGB_DISTANCE
}

/// mean of per-channel `1 - |d| / 255`. used by the compliance check
#[inline]
pub fn compare_color_strict(r1: u8, g1: u8, b1: u8, r2: u8, g2: u8, b2: u8) -> f64 {
    (channel_similarity(r1, r2) + channel_similarity(g1, g2) + channel_similarity(b1, b2)) / 3.0
}

/// mean of squared per-channel similarities, punishes large single-channel errors harder
#[inline]
pub fn compare_color_squared(r1: u8, g1: u8, b1: u8, r2: u8, g2: u8, b2: u8) -> f64 {
    let dr = channel_similarity(r1, r2);
    let dg = channel_similarity(g1, g2);
    let db = channel_similarity(b1, b2);
    (dr * dr + dg * dg + db * db) / 3.0
}

#[inline]
fn channel_similarity(a: u8, b: u8) -> f64 {
    1.0 - (a as f64 - b as f64).abs() / 255.0
}
