//! Conjugate Orthogonal Conjugate Gradient for complex symmetric systems.
//!
//! COCG is CG with the bilinear product `<a, b> = sum a_i b_i` in place of the
//! Hermitian one. It needs `A = A^T` (not `A = A^H`), which
//! [`CurlCurlOperator`](crate::operator::CurlCurlOperator) guarantees.
//!
//! The solver is a two-step state machine: [`Cocg::init`] builds the Krylov
//! state and [`Cocg::iterate`] advances it by one step. Deciding when to stop
//! is left to the caller.

use fdfd_core::VecField;
use num_complex::Complex64 as C64;

use crate::error::{BreakdownKind, Error, Result};
use crate::operator::FieldOperator;

/// Relative size below which a recurrence denominator counts as zero.
pub const BREAKDOWN_TOL: f64 = f64::EPSILON;

/// Search direction, residual and iterate of one solve.
#[derive(Debug, Clone)]
pub struct CocgState {
    pub p: VecField,
    pub r: VecField,
    pub x: VecField,
    /// Cached `<r, r>`.
    rho: C64,
    /// `eps * |b|`.
    term_err: f64,
    /// Completed iterations.
    iteration: usize,
    /// Scratch for `A p`.
    ap: VecField,
}

impl CocgState {
    pub fn term_err(&self) -> f64 {
        self.term_err
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Current residual norm `|r|`.
    pub fn residual_norm(&self) -> f64 {
        self.r.norm()
    }
}

/// COCG bound to an operator and a relative tolerance.
pub struct Cocg<'a, O: FieldOperator + ?Sized> {
    op: &'a O,
    eps: f64,
}

impl<'a, O: FieldOperator + ?Sized> Cocg<'a, O> {
    pub fn new(op: &'a O, eps: f64) -> Self {
        Self { op, eps }
    }

    /// `x0 = seed or 0`, `r0 = b - A x0`, `p0 = r0`, `term_err = eps |b|`.
    pub fn init(&self, z: &VecField, b: &VecField, seed: Option<&VecField>) -> CocgState {
        let shape = self.op.shape();
        let mut ap = VecField::zeros(shape);
        let (x, r) = match seed {
            Some(x0) => {
                self.op.apply(x0, z, &mut ap);
                (x0.clone(), b - &ap)
            }
            None => (VecField::zeros(shape), b.clone()),
        };
        CocgState {
            p: r.clone(),
            rho: r.dot(&r),
            r,
            x,
            term_err: self.eps * b.norm(),
            iteration: 0,
            ap,
        }
    }

    /// One COCG step. Returns the new residual norm `|r'|`.
    ///
    /// A state with an exactly zero residual is already solved; the step is
    /// then a no-op returning `0`.
    pub fn iterate(&self, z: &VecField, state: &mut CocgState) -> Result<f64> {
        let iteration = state.iteration;
        state.iteration += 1;

        let r_norm = state.r.norm();
        if r_norm == 0.0 {
            return Ok(0.0);
        }
        if !state.rho.is_finite() {
            return Err(Error::Breakdown { iteration, kind: BreakdownKind::NonFinite });
        }
        if state.rho.norm() <= BREAKDOWN_TOL * r_norm * r_norm {
            return Err(Error::Breakdown {
                iteration,
                kind: BreakdownKind::QuasiNullResidual,
            });
        }

        self.op.apply(&state.p, z, &mut state.ap);
        let p_ap = state.p.dot(&state.ap);
        if !p_ap.is_finite() {
            return Err(Error::Breakdown { iteration, kind: BreakdownKind::NonFinite });
        }
        if p_ap.norm() <= BREAKDOWN_TOL * state.p.norm() * state.ap.norm() {
            return Err(Error::Breakdown {
                iteration,
                kind: BreakdownKind::SearchDirection,
            });
        }

        let alpha = state.rho / p_ap;
        state.x.axpy(alpha, &state.p);
        state.r.axpy(-alpha, &state.ap);

        let rho_next = state.r.dot(&state.r);
        let beta = rho_next / state.rho;
        state.p.xpby(&state.r, beta);
        state.rho = rho_next;

        Ok(state.r.norm())
    }
}
