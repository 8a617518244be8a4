//! Squared Euclidean norm of complex vectors, `sum |a[i]|^2`.

use crate::capability::SimdCapability;
use num_complex::Complex64 as C64;

/// `sum(|a[i]|^2)` with runtime-dispatched SIMD. Always real and non-negative.
#[inline]
pub fn norm_sqr(a: &[C64], capability: SimdCapability) -> f64 {
    match capability {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        SimdCapability::Avx2 => {
            // SAFETY: AVX2+FMA availability verified in SimdCapability::detect()
            unsafe { norm_sqr_avx2(a) }
        }
        SimdCapability::Scalar => norm_sqr_scalar(a),
    }
}

#[inline]
pub fn norm_sqr_scalar(a: &[C64]) -> f64 {
    a.iter().map(|v| v.norm_sqr()).sum()
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn norm_sqr_avx2(a: &[C64]) -> f64 {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::*;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::*;

    let n = a.len();
    let paired = n / 2 * 2;
    let ptr = a.as_ptr() as *const f64;

    let mut acc = _mm256_setzero_pd();
    let mut i = 0;
    while i < paired {
        let v = _mm256_loadu_pd(ptr.add(i * 2));
        acc = _mm256_fmadd_pd(v, v, acc);
        i += 2;
    }

    let folded = _mm_add_pd(_mm256_castpd256_pd128(acc), _mm256_extractf128_pd(acc, 1));
    let mut lanes = [0.0f64; 2];
    _mm_storeu_pd(lanes.as_mut_ptr(), folded);

    let mut sum = lanes[0] + lanes[1];
    for v in &a[paired..] {
        sum += v.norm_sqr();
    }
    sum
}
