//! Sum of Absolute Differences over every byte of two RGBA buffers (alpha included).
//! Buffers of different length are compared over their common prefix.
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// SIMD SAD using PSADBW, 16 bytes per iteration.
/// caller guarantees both slices have the same length, a multiple of 16.
#[cfg(target_arch = "x86_64")]
#[inline]
unsafe fn sad_simd(target: &[u8], current: &[u8]) -> u64 {
    debug_assert_eq!(target.len(), current.len());
    debug_assert_eq!(target.len() % 16, 0);

    let mut acc = _mm_setzero_si128();
    for offset in (0..target.len()).step_by(16) {
        let t = _mm_loadu_si128(target.as_ptr().add(offset) as *const __m128i);
        let c = _mm_loadu_si128(current.as_ptr().add(offset) as *const __m128i);
        // two u64 lanes, each the SAD of 8 bytes
        acc = _mm_add_epi64(acc, _mm_sad_epu8(t, c));
    }

    let lo = _mm_cvtsi128_si64(acc) as u64;
    let hi = _mm_cvtsi128_si64(_mm_unpackhi_epi64(acc, acc)) as u64;
    lo + hi
}

#[inline]
fn sad_scalar(target: &[u8], current: &[u8]) -> u64 {
    target
        .iter()
        .zip(current)
        .map(|(&t, &c)| (t as i32 - c as i32).unsigned_abs() as u64)
        .sum()
}

#[cfg(target_arch = "x86_64")]
pub fn sad_rgba(target: &[u8], current: &[u8]) -> u64 {
    profiling::scope!("sad_rgba");
    let len = target.len().min(current.len());
    let simd_len = (len / 16) * 16;

    // sse2 is part of the x86_64 baseline; loads stay inside simd_len
    let simd_sum = unsafe { sad_simd(&target[..simd_len], &current[..simd_len]) };
    simd_sum + sad_scalar(&target[simd_len..len], &current[simd_len..len])
}

/// fallback for non-x86_64 targets
#[cfg(not(target_arch = "x86_64"))]
pub fn sad_rgba(target: &[u8], current: &[u8]) -> u64 {
    profiling::scope!("sad_rgba");
    let len = target.len().min(current.len());
    sad_scalar(&target[..len], &current[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_scalar_on_odd_lengths() {
        for len in [0usize, 4, 12, 16, 20, 64, 100, 1028] {
            let a: Vec<u8> = (0..len).map(|i| (i * 37 % 256) as u8).collect();
            let b: Vec<u8> = (0..len).map(|i| (i * 91 % 256) as u8).collect();
            assert_eq!(sad_rgba(&a, &b), sad_scalar(&a, &b), "len {}", len);
        }
    }

    #[test]
    fn test_black_vs_white() {
        let black = [0u8, 0, 0, 255].repeat(10);
        let white = [255u8; 40];
        assert_eq!(sad_rgba(&black, &white), 255 * 3 * 10);
        assert_eq!(sad_rgba(&black, &black), 0);
    }

    #[test]
    fn test_uneven_buffers_use_common_prefix() {
        assert_eq!(sad_rgba(&[10, 10, 10, 10], &[0, 0]), 20);
    }
}
