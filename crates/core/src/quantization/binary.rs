//! Sign-bit binary quantization.
//!
//! Each f32 dimension is quantized to one bit: `bit = 1` iff the component
//! is `>= 0.0` (exact zero maps to 1). Bits are packed LSB-first into u64
//! words, 64 dimensions per word; tail bits past the dimensionality stay
//! zero. A 1536-dim f32 vector (6144 bytes) packs into 24 words (192
//! bytes), a 32× reduction.
//!
//! Because `sign(α·x) = sign(x)` for `α > 0`, packing a vector and packing
//! its L2-normalized form produce identical words; queries can be packed
//! raw.
//!
//! Hamming distance between two packings approximates angular distance for
//! normalized vectors (`cos ≈ 1 − 2·ham/D`) and compiles down to XOR plus
//! the POPCNT instruction.

/// Number of u64 words needed to pack `dims` sign bits.
#[inline]
pub fn words_for(dims: usize) -> usize {
    dims.div_ceil(64)
}

/// Pack a vector's sign bits into freshly allocated u64 words.
pub fn pack(vector: &[f32]) -> Vec<u64> {
    let mut words = vec![0u64; words_for(vector.len())];
    pack_signs(vector, &mut words);
    words
}

/// Pack into a caller-provided buffer, reusing its allocation.
///
/// The buffer is resized to the packing's word count and fully
/// overwritten.
pub fn pack_into(vector: &[f32], out: &mut Vec<u64>) {
    out.clear();
    out.resize(words_for(vector.len()), 0);
    pack_signs(vector, out);
}

#[inline]
fn pack_signs(vector: &[f32], words: &mut [u64]) {
    for (d, &v) in vector.iter().enumerate() {
        if v >= 0.0 {
            words[d / 64] |= 1u64 << (d % 64);
        }
    }
}

/// Popcount Hamming distance between two equal-length packings.
///
/// Word loop unrolled by 4 with independent accumulators so the compiler
/// can keep four XOR+POPCNT chains in flight.
#[inline]
pub fn hamming_distance(a: &[u64], b: &[u64]) -> u32 {
    debug_assert_eq!(a.len(), b.len());

    let len = a.len();
    let chunks = len / 4;
    let mut c0 = 0u32;
    let mut c1 = 0u32;
    let mut c2 = 0u32;
    let mut c3 = 0u32;

    for i in 0..chunks {
        let base = i * 4;
        c0 += (a[base] ^ b[base]).count_ones();
        c1 += (a[base + 1] ^ b[base + 1]).count_ones();
        c2 += (a[base + 2] ^ b[base + 2]).count_ones();
        c3 += (a[base + 3] ^ b[base + 3]).count_ones();
    }

    let mut dist = c0 + c1 + c2 + c3;
    for i in (chunks * 4)..len {
        dist += (a[i] ^ b[i]).count_ones();
    }
    dist
}
