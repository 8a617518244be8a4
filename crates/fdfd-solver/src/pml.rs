//! Absorbing boundaries by complex coordinate stretching.
//!
//! Near each boundary the grid coordinate along an axis is mapped through
//! `s(d) = 1 + i * sigma(d) / omega`, where `d` in `[0, 1]` is the depth into
//! the layer and `sigma(d) = sigma_max * d^m` with
//! `sigma_max = (m + 1) * ln_r / (2 * thickness)`. Interior cells have `s = 1`.
//!
//! Stretch factors are sampled at integer points (backward differences, H to E)
//! and half-integer points (forward differences, E to H). The diagonal
//! preconditioner `pre` is the square root of the product of the three
//! stretch factors at each component's Yee location, which makes
//! `pre * (curl curl - z) * inv_pre` complex symmetric.

use fdfd_core::{Axis, GridShape, VecField};
use num_complex::Complex64 as C64;

use crate::error::{Error, Result};

/// Absorption profile of the layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PmlParams {
    /// Reference angular frequency in inverse cells.
    pub omega: f64,
    /// Polynomial grading exponent.
    pub m: f64,
    /// Target `-ln(R)` for normal incidence reflection `R`.
    pub ln_r: f64,
}

impl Default for PmlParams {
    fn default() -> Self {
        Self {
            omega: 1.0,
            m: 4.0,
            ln_r: 16.0,
        }
    }
}

impl PmlParams {
    /// Default grading tuned for angular frequency `omega`.
    pub fn with_omega(omega: f64) -> Self {
        Self {
            omega,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.omega.is_finite() && self.omega > 0.0) {
            return Err(Error::InvalidPmlParams(format!(
                "omega must be positive and finite, got {}",
                self.omega
            )));
        }
        if !(self.m.is_finite() && self.m >= 0.0) {
            return Err(Error::InvalidPmlParams(format!(
                "grading exponent must be non-negative, got {}",
                self.m
            )));
        }
        if !(self.ln_r.is_finite() && self.ln_r >= 0.0) {
            return Err(Error::InvalidPmlParams(format!(
                "ln_r must be non-negative, got {}",
                self.ln_r
            )));
        }
        Ok(())
    }

    /// Conductivity at distance `dist` (in cells) past the inner edge of a
    /// layer `thickness` cells thick.
    pub fn sigma(&self, thickness: usize, dist: f64) -> f64 {
        if thickness == 0 || dist <= 0.0 {
            return 0.0;
        }
        let th = thickness as f64;
        let depth = (dist / th).min(1.0);
        (self.m + 1.0) * self.ln_r / (2.0 * th) * depth.powf(self.m)
    }

    /// Stretch factor at continuous coordinate `u` on an axis of `n` cells
    /// with layer thicknesses `(lo, hi)`.
    pub fn stretch(&self, u: f64, n: usize, (lo, hi): (usize, usize)) -> C64 {
        let sigma = self.sigma(lo, lo as f64 - u) + self.sigma(hi, u - (n - hi) as f64);
        C64::new(1.0, sigma / self.omega)
    }
}

/// Layer thicknesses in cells, `((-x, +x), (-y, +y), (-z, +z))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PmlThicknesses(pub [(usize, usize); 3]);

impl PmlThicknesses {
    /// No absorbing layers anywhere; the grid is hard-truncated.
    pub const NONE: Self = Self([(0, 0); 3]);

    pub fn new(x: (usize, usize), y: (usize, usize), z: (usize, usize)) -> Self {
        Self([x, y, z])
    }

    /// The same thickness on all six faces.
    pub fn uniform(thickness: usize) -> Self {
        Self([(thickness, thickness); 3])
    }

    #[inline]
    pub fn get(&self, axis: Axis) -> (usize, usize) {
        self.0[axis.index()]
    }

    /// Every layer must fit in its half of the axis.
    pub fn validate(&self, shape: GridShape) -> Result<()> {
        for axis in Axis::ALL {
            let n = shape.extent(axis);
            let (lo, hi) = self.get(axis);
            for (side, th) in [("-", lo), ("+", hi)] {
                if th > n / 2 {
                    return Err(Error::InvalidPml {
                        axis,
                        reason: format!(
                            "{}{} layer of {} cells exceeds half of the {}-cell extent",
                            side, axis, th, n
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

impl From<[(usize, usize); 3]> for PmlThicknesses {
    fn from(value: [(usize, usize); 3]) -> Self {
        Self(value)
    }
}

/// Stretch factors along one axis.
#[derive(Debug, Clone)]
pub struct AxisStretch {
    /// Sampled at `u = i`.
    pub int: Vec<C64>,
    /// Sampled at `u = i + 1/2`.
    pub half: Vec<C64>,
}

/// Stretch factors for all three axes of a grid.
#[derive(Debug, Clone)]
pub struct StretchFactors {
    shape: GridShape,
    axes: [AxisStretch; 3],
}

impl StretchFactors {
    pub fn new(shape: GridShape, thicknesses: &PmlThicknesses, params: &PmlParams) -> Result<Self> {
        shape.validate()?;
        params.validate()?;
        thicknesses.validate(shape)?;

        let axes = Axis::ALL.map(|axis| {
            let n = shape.extent(axis);
            let th = thicknesses.get(axis);
            AxisStretch {
                int: (0..n).map(|i| params.stretch(i as f64, n, th)).collect(),
                half: (0..n).map(|i| params.stretch(i as f64 + 0.5, n, th)).collect(),
            }
        });
        Ok(Self { shape, axes })
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    #[inline]
    pub fn axis(&self, axis: Axis) -> &AxisStretch {
        &self.axes[axis.index()]
    }

    /// Product of the stretch factors at the Yee location of component
    /// `comp` in cell `(i, j, k)`: half samples along `comp`, integer samples
    /// along the other two axes.
    #[inline]
    pub fn volume_factor(&self, comp: Axis, i: usize, j: usize, k: usize) -> C64 {
        let pick = |axis: Axis, n: usize| {
            let s = self.axis(axis);
            if axis == comp { s.half[n] } else { s.int[n] }
        };
        pick(Axis::X, i) * pick(Axis::Y, j) * pick(Axis::Z, k)
    }
}

/// The diagonal scaling pair. `pre[i] * inv_pre[i] == 1` everywhere.
#[derive(Debug, Clone)]
pub struct Preconditioner {
    pre: VecField,
    inv_pre: VecField,
}

impl Preconditioner {
    pub fn from_stretch(stretch: &StretchFactors) -> Self {
        let pre = VecField::from_fn(stretch.shape(), |comp, i, j, k| {
            stretch.volume_factor(comp, i, j, k).sqrt()
        });
        let inv_pre = pre.recip();
        Self { pre, inv_pre }
    }

    pub fn pre(&self) -> &VecField {
        &self.pre
    }

    pub fn inv_pre(&self) -> &VecField {
        &self.inv_pre
    }

    pub fn into_pair(self) -> (VecField, VecField) {
        (self.pre, self.inv_pre)
    }
}

/// Build `(pre, inv_pre)` for a grid.
pub fn preconditioners(
    shape: GridShape,
    thicknesses: &PmlThicknesses,
    params: &PmlParams,
) -> Result<(VecField, VecField)> {
    let stretch = StretchFactors::new(shape, thicknesses, params)?;
    Ok(Preconditioner::from_stretch(&stretch).into_pair())
}
