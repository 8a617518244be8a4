//! Preconditioned COCG driver for `(curl curl - z) E = b`.
//!
//! [`solve`] builds the PML stretching once, symmetrizes the system with the
//! diagonal preconditioner, runs COCG until the residual drops below
//! `eps * |b|` or the iteration cap is hit, and returns the field in physical
//! (unscaled) form together with the residual history.

use fdfd_core::{GridShape, VecField};

use crate::cocg::Cocg;
use crate::error::{Error, Result};
use crate::monitor::Monitor;
use crate::operator::{CurlCurlOperator, FieldOperator};
use crate::pml::{PmlParams, PmlThicknesses};

/// Which of the two transposed systems to solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolveMode {
    /// `(curl curl - z) E = b`.
    #[default]
    Forward,
    /// `(curl curl - z)^T F = c`, for adjoint sensitivities.
    Adjoint,
}

/// Solver configuration.
#[derive(Debug, Clone)]
pub struct SolveParams {
    /// Absorbing layer thickness per face.
    pub thicknesses: PmlThicknesses,
    /// Absorbing layer profile.
    pub pml: PmlParams,
    /// Relative residual tolerance.
    pub eps: f64,
    /// Iteration cap.
    pub max_iters: usize,
    pub mode: SolveMode,
    /// Call the monitor every this many iterations.
    pub monitor_every_n: usize,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            thicknesses: PmlThicknesses::NONE,
            pml: PmlParams::default(),
            eps: 1e-6,
            max_iters: 1000,
            mode: SolveMode::Forward,
            monitor_every_n: 100,
        }
    }
}

impl SolveParams {
    pub fn validate(&self) -> Result<()> {
        if !self.eps.is_finite() || self.eps < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "eps must be finite and non-negative, got {}",
                self.eps
            )));
        }
        if self.monitor_every_n == 0 {
            return Err(Error::InvalidConfig(
                "monitor_every_n must be at least 1".to_string(),
            ));
        }
        self.pml.validate()
    }
}

/// Outcome of a [`solve`].
#[derive(Debug, Clone)]
pub struct SolveResult {
    /// Field in physical units.
    pub x: VecField,
    /// `|r|` of the preconditioned residual after each iteration.
    pub errs: Vec<f64>,
    /// Convergence threshold `eps * |pre b|`.
    pub term_err: f64,
    pub converged: bool,
}

impl SolveResult {
    pub fn iterations(&self) -> usize {
        self.errs.len()
    }

    /// Final recorded residual, if any iteration ran.
    pub fn final_err(&self) -> Option<f64> {
        self.errs.last().copied()
    }

    pub fn into_parts(self) -> (VecField, Vec<f64>) {
        (self.x, self.errs)
    }
}

/// Solve from a zero initial guess.
pub fn solve<M>(z: &VecField, b: &VecField, params: &SolveParams, monitor: &mut M) -> Result<SolveResult>
where
    M: Monitor + ?Sized,
{
    solve_inner(z, b, None, params, monitor)
}

/// Solve starting from `x0`, given in physical units.
pub fn solve_with_guess<M>(
    z: &VecField,
    b: &VecField,
    x0: &VecField,
    params: &SolveParams,
    monitor: &mut M,
) -> Result<SolveResult>
where
    M: Monitor + ?Sized,
{
    solve_inner(z, b, Some(x0), params, monitor)
}

fn check_shape(what: &'static str, expected: GridShape, actual: GridShape) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::ShapeMismatch { what, expected, actual })
    }
}

/// `(scale_in, scale_out)`: the solve runs on `y = scale_in x` and returns
/// `x = scale_out y`.
fn scalings(op: &CurlCurlOperator, mode: SolveMode) -> (&VecField, &VecField) {
    let precond = op.preconditioner();
    match mode {
        SolveMode::Forward => (precond.pre(), precond.inv_pre()),
        SolveMode::Adjoint => (precond.inv_pre(), precond.pre()),
    }
}

fn solve_inner<M>(
    z: &VecField,
    b: &VecField,
    x0: Option<&VecField>,
    params: &SolveParams,
    monitor: &mut M,
) -> Result<SolveResult>
where
    M: Monitor + ?Sized,
{
    let shape = z.shape();
    check_shape("b", shape, b.shape())?;
    if let Some(x0) = x0 {
        check_shape("x0", shape, x0.shape())?;
    }
    params.validate()?;
    shape.validate()?;

    let op = CurlCurlOperator::from_pml(shape, &params.thicknesses, &params.pml)?;
    let (scale_in, scale_out) = scalings(&op, params.mode);

    log::debug!(
        "COCG {:?} solve on {} grid, PML {:?}, eps {:e}, max_iters {}",
        params.mode,
        shape,
        params.thicknesses.0,
        params.eps,
        params.max_iters
    );

    let rhs = scale_in * b;
    let seed = x0.map(|x0| scale_in * x0);

    let cocg = Cocg::new(&op, params.eps);
    let mut state = cocg.init(z, &rhs, seed.as_ref());
    let term_err = state.term_err();

    let mut errs = Vec::with_capacity(params.max_iters.min(4096));
    for i in 0..params.max_iters {
        let err = cocg.iterate(z, &mut state)?;
        errs.push(err);
        if i % params.monitor_every_n == 0 {
            monitor.on_progress(&(scale_out * &state.x), &errs);
        }
        if err <= term_err {
            break;
        }
    }

    let x = scale_out * &state.x;
    monitor.on_progress(&x, &errs);

    let converged = match errs.last() {
        Some(&err) => err <= term_err,
        None => state.residual_norm() <= term_err,
    };
    if converged {
        log::debug!("COCG converged after {} iterations", errs.len());
    } else {
        log::warn!(
            "COCG did not converge in {} iterations: residual {:.3e}, target {:.3e}",
            errs.len(),
            errs.last().copied().unwrap_or_else(|| state.residual_norm()),
            term_err
        );
    }

    Ok(SolveResult {
        x,
        errs,
        term_err,
        converged,
    })
}

/// Relative residual of `x` against the unpreconditioned system.
///
/// Forward mode measures `|(curl curl - z) x - b| / |b|`; adjoint mode
/// measures the transposed system. With `b = 0` the absolute residual is
/// returned.
pub fn physical_residual(z: &VecField, b: &VecField, x: &VecField, params: &SolveParams) -> Result<f64> {
    let shape = z.shape();
    check_shape("b", shape, b.shape())?;
    check_shape("x", shape, x.shape())?;

    let op = CurlCurlOperator::from_pml(shape, &params.thicknesses, &params.pml)?;
    let mut ax = VecField::zeros(shape);
    match params.mode {
        SolveMode::Forward => op.physical().apply(x, z, &mut ax),
        SolveMode::Adjoint => {
            // (curl curl - z)^T = pre^2 (curl curl - z) inv_pre^2
            let precond = op.preconditioner();
            let inv_sq = precond.inv_pre() * precond.inv_pre();
            let pre_sq = precond.pre() * precond.pre();
            op.physical().apply(&(&inv_sq * x), z, &mut ax);
            ax.mul_assign_elementwise(&pre_sq);
        }
    }

    let r = (&ax - b).norm();
    let b_norm = b.norm();
    Ok(if b_norm > 0.0 { r / b_norm } else { r })
}
