//! # fdfd
//!
//! Frequency-domain solver for Maxwell's equations on structured grids.
//!
//! Solves the curl-curl form `(curl curl - w^2 eps) E = -i w J` on a Yee
//! grid with perfectly matched layers, using a diagonal preconditioner that
//! makes the system complex symmetric and COCG to solve it.
//!
//! ## Quick Start
//!
//! ```rust
//! use fdfd::prelude::*;
//!
//! let shape = GridShape::new(6, 6, 6);
//! let omega = 0.6;
//! let z = VecField::filled(shape, C64::new(omega * omega, 0.0));
//! let b = VecField::zeros(shape);
//!
//! let params = SolveParams {
//!     thicknesses: PmlThicknesses::uniform(2),
//!     pml: PmlParams::with_omega(omega),
//!     ..Default::default()
//! };
//! let result = solve(&z, &b, &params, &mut NoopMonitor).unwrap();
//! assert!(result.converged);
//! assert_eq!(result.errs, vec![0.0]);
//! ```
//!
//! ## Monitoring
//!
//! ```rust,ignore
//! let mut monitor = |x: &VecField, errs: &[f64]| {
//!     println!("{} iterations, max |E| = {}", errs.len(), x.max_abs());
//! };
//! let (e, errs) = fdfd::solve(&z, &b, &params, &mut monitor)?.into_parts();
//! ```

// Re-export member crates
pub use fdfd_core as core;
pub use fdfd_simd as simd;
pub use fdfd_solver as solver;

// ============================================================================
// Convenient re-exports from fdfd_core
// ============================================================================

pub use fdfd_core::{
    Axis,
    // Errors
    Error as CoreError,
    GridShape,
    VecField,
};

// ============================================================================
// Convenient re-exports from fdfd_solver
// ============================================================================

pub use fdfd_solver::{
    BreakdownKind,
    // Krylov solver
    Cocg,
    CocgState,
    // Operators
    CurlCurlOperator,
    // Errors
    Error as SolverError,
    FieldOperator,
    // Monitors
    LogMonitor,
    Monitor,
    NoopMonitor,
    PhysicalOperator,
    // Absorbing layers
    PmlParams,
    PmlThicknesses,
    Preconditioner,
    // Driver
    SolveMode,
    SolveParams,
    SolveResult,
    StretchFactors,
    // Dense verification
    assemble_dense,
    physical_residual,
    preconditioners,
    solve,
    solve_complex,
    solve_dense,
    solve_with_guess,
};

pub use fdfd_simd::SimdCapability;

// ============================================================================
// Re-export commonly used external types
// ============================================================================

/// Re-export of nalgebra's dynamic vector type.
pub use nalgebra::DVector;

/// Re-export of nalgebra's dynamic matrix type.
pub use nalgebra::DMatrix;

/// Re-export of num_complex's `f64` complex type.
pub use num_complex::Complex64 as C64;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module containing commonly used types and traits.
///
/// ```rust
/// use fdfd::prelude::*;
/// ```
pub mod prelude {
    // Grid and fields
    pub use crate::{Axis, GridShape, VecField};

    // Driver
    pub use crate::{SolveMode, SolveParams, SolveResult, solve, solve_with_guess};

    // Absorbing layers
    pub use crate::{PmlParams, PmlThicknesses};

    // Monitors
    pub use crate::{LogMonitor, Monitor, NoopMonitor};

    // Operators
    pub use crate::{CurlCurlOperator, FieldOperator};

    // Common external types
    pub use crate::{C64, DMatrix, DVector};
}
