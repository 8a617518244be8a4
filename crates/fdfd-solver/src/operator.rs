//! Matrix-free field operators.
//!
//! [`FieldOperator`] abstracts the matvec so the Krylov solver never sees a
//! matrix. [`CurlCurlOperator`] is the stretched Yee double curl:
//!
//! ```text
//! A(x) = pre * curl_h(curl_e(inv_pre * x)) - z * x
//! ```
//!
//! `curl_e` uses forward differences `(f[i+1] - f[i]) / s_half[i]` and
//! `curl_h` backward differences `(f[i] - f[i-1]) / s_int[i]`, with zero
//! values beyond the grid edge. With those truncations the backward
//! difference is exactly minus the transpose of the forward one, which is what
//! makes `A` complex symmetric.

use fdfd_core::{Axis, GridShape, VecField};
use num_complex::Complex64 as C64;
use rayon::prelude::*;

use crate::error::Result;
use crate::pml::{PmlParams, PmlThicknesses, Preconditioner, StretchFactors};

const ZERO: C64 = C64::new(0.0, 0.0);

/// A linear operator on vector fields, parameterised by a coefficient field
/// `z` (`omega^2 * eps`).
pub trait FieldOperator: Send + Sync {
    /// Grid the operator acts on.
    fn shape(&self) -> GridShape;

    /// `out = A(x; z)`. All three fields must have [`FieldOperator::shape`].
    fn apply(&self, x: &VecField, z: &VecField, out: &mut VecField);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Difference {
    Forward,
    Backward,
}

/// The preconditioned curl-curl-minus-mass operator.
#[derive(Debug, Clone)]
pub struct CurlCurlOperator {
    shape: GridShape,
    /// `1 / s` at integer samples, per axis.
    inv_s_int: [Vec<C64>; 3],
    /// `1 / s` at half-integer samples, per axis.
    inv_s_half: [Vec<C64>; 3],
    precond: Preconditioner,
}

impl CurlCurlOperator {
    pub fn new(stretch: &StretchFactors) -> Self {
        let invert = |v: &[C64]| v.iter().map(|s| s.inv()).collect::<Vec<_>>();
        Self {
            shape: stretch.shape(),
            inv_s_int: Axis::ALL.map(|a| invert(&stretch.axis(a).int)),
            inv_s_half: Axis::ALL.map(|a| invert(&stretch.axis(a).half)),
            precond: Preconditioner::from_stretch(stretch),
        }
    }

    /// Build stretch factors and preconditioners for `shape` in one go.
    pub fn from_pml(
        shape: GridShape,
        thicknesses: &PmlThicknesses,
        params: &PmlParams,
    ) -> Result<Self> {
        let stretch = StretchFactors::new(shape, thicknesses, params)?;
        Ok(Self::new(&stretch))
    }

    pub fn preconditioner(&self) -> &Preconditioner {
        &self.precond
    }

    /// E (edges) to H (faces).
    pub fn curl_e(&self, e: &VecField) -> VecField {
        self.curl(e, Difference::Forward)
    }

    /// H (faces) to E (edges).
    pub fn curl_h(&self, h: &VecField) -> VecField {
        self.curl(h, Difference::Backward)
    }

    /// Stretched double curl without preconditioning or mass term.
    pub fn curl_curl(&self, e: &VecField) -> VecField {
        self.curl_h(&self.curl_e(e))
    }

    /// Stretched gradient of a node-centred scalar, landing on E locations.
    /// Its `curl_e` vanishes identically.
    pub fn gradient(&self, phi: &[C64]) -> VecField {
        assert_eq!(phi.len(), self.shape.len(), "potential length mismatch");
        let mut out = VecField::zeros(self.shape);
        for axis in Axis::ALL {
            self.accumulate(out.component_mut(axis), phi, axis, Difference::Forward, 1.0);
        }
        out
    }

    /// `out = (curl curl - z) x`, the unpreconditioned physical operator.
    pub fn apply_physical(&self, x: &VecField, z: &VecField, out: &mut VecField) {
        self.check_shapes(x, z, out);
        let cc = self.curl_curl(x);
        for axis in Axis::ALL {
            let (cc, x, z) = (cc.component(axis), x.component(axis), z.component(axis));
            out.component_mut(axis)
                .par_iter_mut()
                .enumerate()
                .for_each(|(idx, o)| *o = cc[idx] - z[idx] * x[idx]);
        }
    }

    /// View of this operator that applies [`CurlCurlOperator::apply_physical`].
    pub fn physical(&self) -> PhysicalOperator<'_> {
        PhysicalOperator(self)
    }

    fn curl(&self, f: &VecField, diff: Difference) -> VecField {
        assert_eq!(f.shape(), self.shape, "field does not match operator grid");
        let mut out = VecField::zeros(self.shape);
        for comp in Axis::ALL {
            let (a, b) = comp.others();
            let dst = out.component_mut(comp);
            self.accumulate(dst, f.component(b), a, diff, 1.0);
            self.accumulate(dst, f.component(a), b, diff, -1.0);
        }
        out
    }

    /// `out += sign * D_axis(src)` for one stretched difference.
    fn accumulate(&self, out: &mut [C64], src: &[C64], axis: Axis, diff: Difference, sign: f64) {
        let shape = self.shape;
        let n = shape.extent(axis);
        let stride = shape.stride(axis);
        let plane = shape.ny * shape.nz;
        let inv_s = match diff {
            Difference::Forward => &self.inv_s_half[axis.index()],
            Difference::Backward => &self.inv_s_int[axis.index()],
        };

        out.par_chunks_mut(plane).enumerate().for_each(|(i, chunk)| {
            let base = i * plane;
            for (l, o) in chunk.iter_mut().enumerate() {
                let idx = base + l;
                let c = match axis {
                    Axis::X => i,
                    Axis::Y => l / shape.nz,
                    Axis::Z => l % shape.nz,
                };
                let d = match diff {
                    Difference::Forward => {
                        let next = if c + 1 < n { src[idx + stride] } else { ZERO };
                        next - src[idx]
                    }
                    Difference::Backward => {
                        let prev = if c > 0 { src[idx - stride] } else { ZERO };
                        src[idx] - prev
                    }
                };
                *o += d * inv_s[c] * sign;
            }
        });
    }

    fn check_shapes(&self, x: &VecField, z: &VecField, out: &VecField) {
        assert_eq!(x.shape(), self.shape, "x does not match operator grid");
        assert_eq!(z.shape(), self.shape, "z does not match operator grid");
        assert_eq!(out.shape(), self.shape, "output does not match operator grid");
    }
}

impl FieldOperator for CurlCurlOperator {
    fn shape(&self) -> GridShape {
        self.shape
    }

    fn apply(&self, x: &VecField, z: &VecField, out: &mut VecField) {
        self.check_shapes(x, z, out);
        let scaled = x * self.precond.inv_pre();
        let cc = self.curl_curl(&scaled);
        for axis in Axis::ALL {
            let pre = self.precond.pre().component(axis);
            let (cc, x, z) = (cc.component(axis), x.component(axis), z.component(axis));
            out.component_mut(axis)
                .par_iter_mut()
                .enumerate()
                .for_each(|(idx, o)| *o = pre[idx] * cc[idx] - z[idx] * x[idx]);
        }
    }
}

/// `(curl curl - z)` without diagonal scaling. Not symmetric once PML is
/// present; used for residual checks and dense reference solves.
#[derive(Debug, Clone, Copy)]
pub struct PhysicalOperator<'a>(&'a CurlCurlOperator);

impl FieldOperator for PhysicalOperator<'_> {
    fn shape(&self) -> GridShape {
        self.0.shape
    }

    fn apply(&self, x: &VecField, z: &VecField, out: &mut VecField) {
        self.0.apply_physical(x, z, out);
    }
}
