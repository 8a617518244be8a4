//! Runtime detection of the SIMD level used by the field reductions.

/// SIMD level available to the reduction kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdCapability {
    /// AVX2 + FMA, two complex values per 256-bit lane.
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    Avx2,
    /// Portable scalar loop.
    Scalar,
}

impl SimdCapability {
    /// Probe the running CPU.
    #[inline]
    pub fn detect() -> Self {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
                return SimdCapability::Avx2;
            }
        }
        SimdCapability::Scalar
    }

    #[inline]
    pub fn is_simd(&self) -> bool {
        !matches!(self, SimdCapability::Scalar)
    }

    /// Short label used in logs and benchmark ids.
    pub fn description(&self) -> &'static str {
        match self {
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            SimdCapability::Avx2 => "AVX2+FMA",
            SimdCapability::Scalar => "scalar",
        }
    }
}

impl Default for SimdCapability {
    fn default() -> Self {
        Self::detect()
    }
}

impl std::fmt::Display for SimdCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}
