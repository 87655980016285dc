//! SIMD-accelerated dot product.
//!
//! Provides NEON (aarch64) and AVX2+FMA (x86_64) implementations of the
//! f32 dot product that dominates the cosine scanner's inner loop. Falls
//! back to an unrolled scalar loop on unsupported platforms or when AVX2
//! is unavailable at runtime.

/// Dot product between two f32 slices.
#[inline]
#[allow(unreachable_code)]
pub fn dot_f32(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    #[cfg(target_arch = "aarch64")]
    {
        return unsafe { neon_dot_f32(a, b) };
    }
    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("avx2") && std::arch::is_x86_feature_detected!("fma")
        {
            return unsafe { avx2_dot_f32(a, b) };
        }
    }
    scalar_dot_f32(a, b)
}

/// Scalar fallback, unrolled by 4 with independent accumulators.
fn scalar_dot_f32(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let chunks = len / 4;
    let mut s0 = 0.0f32;
    let mut s1 = 0.0f32;
    let mut s2 = 0.0f32;
    let mut s3 = 0.0f32;

    for i in 0..chunks {
        let base = i * 4;
        s0 += a[base] * b[base];
        s1 += a[base + 1] * b[base + 1];
        s2 += a[base + 2] * b[base + 2];
        s3 += a[base + 3] * b[base + 3];
    }

    let mut sum = (s0 + s1) + (s2 + s3);
    for i in (chunks * 4)..len {
        sum += a[i] * b[i];
    }
    sum
}

// ============================================================================
// NEON implementation (aarch64)
// ============================================================================

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

#[cfg(target_arch = "aarch64")]
unsafe fn neon_dot_f32(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    let mut s0 = vdupq_n_f32(0.0);
    let mut s1 = vdupq_n_f32(0.0);
    let mut s2 = vdupq_n_f32(0.0);
    let mut s3 = vdupq_n_f32(0.0);

    let chunks = len / 16;
    for i in 0..chunks {
        let base = i * 16;
        s0 = vfmaq_f32(s0, vld1q_f32(a_ptr.add(base)), vld1q_f32(b_ptr.add(base)));
        s1 = vfmaq_f32(
            s1,
            vld1q_f32(a_ptr.add(base + 4)),
            vld1q_f32(b_ptr.add(base + 4)),
        );
        s2 = vfmaq_f32(
            s2,
            vld1q_f32(a_ptr.add(base + 8)),
            vld1q_f32(b_ptr.add(base + 8)),
        );
        s3 = vfmaq_f32(
            s3,
            vld1q_f32(a_ptr.add(base + 12)),
            vld1q_f32(b_ptr.add(base + 12)),
        );
    }

    let mut sum = vaddvq_f32(vaddq_f32(vaddq_f32(s0, s1), vaddq_f32(s2, s3)));

    for i in (chunks * 16)..len {
        sum += *a_ptr.add(i) * *b_ptr.add(i);
    }
    sum
}

// ============================================================================
// AVX2+FMA implementation (x86_64)
// ============================================================================

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "x86_64")]
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn hsum_f32x8(v: __m256) -> f32 {
    let hi128 = _mm256_extractf128_ps(v, 1);
    let lo128 = _mm256_castps256_ps128(v);
    let sum128 = _mm_add_ps(lo128, hi128);
    let hi64 = _mm_movehl_ps(sum128, sum128);
    let sum64 = _mm_add_ps(sum128, hi64);
    let hi32 = _mm_shuffle_ps(sum64, sum64, 0x55);
    _mm_cvtss_f32(_mm_add_ss(sum64, hi32))
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2,fma")]
unsafe fn avx2_dot_f32(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    let mut s0 = _mm256_setzero_ps();
    let mut s1 = _mm256_setzero_ps();

    let chunks = len / 16;
    for i in 0..chunks {
        let base = i * 16;
        s0 = _mm256_fmadd_ps(
            _mm256_loadu_ps(a_ptr.add(base)),
            _mm256_loadu_ps(b_ptr.add(base)),
            s0,
        );
        s1 = _mm256_fmadd_ps(
            _mm256_loadu_ps(a_ptr.add(base + 8)),
            _mm256_loadu_ps(b_ptr.add(base + 8)),
            s1,
        );
    }

    let mut sum = hsum_f32x8(_mm256_add_ps(s0, s1));

    for i in (chunks * 16)..len {
        sum += *a_ptr.add(i) * *b_ptr.add(i);
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_dot(a: &[f32], b: &[f32]) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| x as f64 * y as f64)
            .sum()
    }

    #[test]
    fn test_dot_matches_naive() {
        // Lengths straddling every remainder path: 0, <4, chunk edges, large.
        for len in [0usize, 3, 4, 15, 16, 17, 64, 100, 1536] {
            let a: Vec<f32> = (0..len).map(|i| ((i * 37 % 23) as f32 - 11.0) * 0.1).collect();
            let b: Vec<f32> = (0..len).map(|i| ((i * 53 % 19) as f32 - 9.0) * 0.1).collect();
            let got = dot_f32(&a, &b) as f64;
            let want = naive_dot(&a, &b);
            assert!(
                (got - want).abs() < 1e-3,
                "len={len}: got {got}, want {want}"
            );
        }
    }

    #[test]
    fn test_dot_unit_vectors() {
        let a = [1.0f32, 0.0, 0.0, 0.0];
        let b = [0.0f32, 1.0, 0.0, 0.0];
        assert_eq!(dot_f32(&a, &a), 1.0);
        assert_eq!(dot_f32(&a, &b), 0.0);
    }

    #[test]
    fn test_scalar_path_agrees_with_dispatch() {
        let a: Vec<f32> = (0..200).map(|i| (i as f32).sin()).collect();
        let b: Vec<f32> = (0..200).map(|i| (i as f32).cos()).collect();
        let scalar = scalar_dot_f32(&a, &b);
        let dispatched = dot_f32(&a, &b);
        assert!((scalar - dispatched).abs() < 1e-3);
    }
}
