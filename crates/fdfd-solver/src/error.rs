//! Error types for fdfd-solver.

use std::fmt;

use fdfd_core::{Axis, GridShape};
use thiserror::Error;

/// Which COCG denominator vanished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownKind {
    /// `<p, A p>` is zero relative to `|p| |A p|`.
    SearchDirection,
    /// `<r, r>` is zero relative to `|r|^2` while `r` itself is not.
    QuasiNullResidual,
    /// A recurrence coefficient came out NaN or infinite.
    NonFinite,
}

impl fmt::Display for BreakdownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BreakdownKind::SearchDirection => "<p, Ap> vanished",
            BreakdownKind::QuasiNullResidual => "<r, r> vanished for a nonzero residual",
            BreakdownKind::NonFinite => "non-finite recurrence coefficient",
        })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("shape mismatch: {what} is {actual}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: GridShape,
        actual: GridShape,
    },

    #[error("invalid PML on {axis} axis: {reason}")]
    InvalidPml { axis: Axis, reason: String },

    #[error("invalid PML parameters: {0}")]
    InvalidPmlParams(String),

    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),

    #[error("COCG breakdown at iteration {iteration}: {kind}")]
    Breakdown { iteration: usize, kind: BreakdownKind },

    #[error("singular matrix")]
    SingularMatrix,

    #[error("invalid matrix dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Core(#[from] fdfd_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
