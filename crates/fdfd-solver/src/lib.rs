//! Frequency-domain Maxwell solver.
//!
//! This crate provides:
//! - PML coordinate stretching and the symmetrizing diagonal preconditioner
//! - The Yee curl-curl operator with absorbing boundaries
//! - COCG, a Krylov solver for complex symmetric systems
//! - A forward/adjoint driver with progress monitoring
//! - Dense assembly and LU solves for verification on small grids

pub mod cocg;
pub mod error;
pub mod linear;
pub mod monitor;
pub mod operator;
pub mod pml;
pub mod solve;

pub use cocg::{Cocg, CocgState};
pub use error::{BreakdownKind, Error, Result};
pub use linear::{assemble_dense, solve_complex, solve_dense};
pub use monitor::{LogMonitor, Monitor, NoopMonitor};
pub use operator::{CurlCurlOperator, FieldOperator, PhysicalOperator};
pub use pml::{PmlParams, PmlThicknesses, Preconditioner, StretchFactors, preconditioners};
pub use solve::{
    SolveMode, SolveParams, SolveResult, physical_residual, solve, solve_with_guess,
};
