//! SIMD-accelerated reductions over complex field buffers.
//!
//! Provides runtime-detected implementations of:
//! - the bilinear dot product `sum(a[i] * b[i])` used by COCG
//! - the squared Euclidean norm used for residual measurement
//!
//! On x86/x86_64 the AVX2+FMA path is used when available; every other target
//! falls back to scalar loops.

pub mod bilinear_dot;
pub mod capability;
pub mod norm;

pub use bilinear_dot::{bilinear_dot, bilinear_dot_scalar};
pub use capability::SimdCapability;
pub use norm::{norm_sqr, norm_sqr_scalar};
