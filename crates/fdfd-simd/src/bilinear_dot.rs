//! Bilinear (non-conjugated) complex dot product.
//!
//! Computes `sum(a[i] * b[i])`. Complex-symmetric Krylov methods such as COCG
//! are built on this product rather than the Hermitian one.

use crate::capability::SimdCapability;
use num_complex::Complex64 as C64;

/// `sum(a[i] * b[i])` with runtime-dispatched SIMD.
///
/// # Panics
///
/// Panics if `a` and `b` have different lengths.
#[inline]
pub fn bilinear_dot(a: &[C64], b: &[C64], capability: SimdCapability) -> C64 {
    assert_eq!(a.len(), b.len(), "Vector lengths must match");

    match capability {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        SimdCapability::Avx2 => {
            // SAFETY: AVX2+FMA availability verified in SimdCapability::detect()
            unsafe { bilinear_dot_avx2(a, b) }
        }
        SimdCapability::Scalar => bilinear_dot_scalar(a, b),
    }
}

/// Reference implementation.
#[inline]
pub fn bilinear_dot_scalar(a: &[C64], b: &[C64]) -> C64 {
    a.iter()
        .zip(b.iter())
        .fold(C64::new(0.0, 0.0), |acc, (ai, bi)| acc + ai * bi)
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn bilinear_dot_avx2(a: &[C64], b: &[C64]) -> C64 {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::*;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::*;

    let n = a.len();
    let paired = n / 2 * 2;
    let a_ptr = a.as_ptr() as *const f64;
    let b_ptr = b.as_ptr() as *const f64;

    // Lanes hold [re0, im0, re1, im1].
    let mut acc = _mm256_setzero_pd();
    let mut i = 0;
    while i < paired {
        let av = _mm256_loadu_pd(a_ptr.add(i * 2));
        let bv = _mm256_loadu_pd(b_ptr.add(i * 2));

        let a_re = _mm256_movedup_pd(av);
        let a_im = _mm256_permute_pd(av, 0b1111);
        let b_flip = _mm256_permute_pd(bv, 0b0101);

        // (ar*br - ai*bi, ar*bi + ai*br)
        let cross = _mm256_mul_pd(a_im, b_flip);
        acc = _mm256_add_pd(acc, _mm256_fmaddsub_pd(a_re, bv, cross));
        i += 2;
    }

    let folded = _mm_add_pd(_mm256_castpd256_pd128(acc), _mm256_extractf128_pd(acc, 1));
    let mut lanes = [0.0f64; 2];
    _mm_storeu_pd(lanes.as_mut_ptr(), folded);

    let mut sum = C64::new(lanes[0], lanes[1]);
    for j in paired..n {
        sum += a[j] * b[j];
    }
    sum
}
