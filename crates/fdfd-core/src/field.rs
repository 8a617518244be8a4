//! Three-component complex vector fields on a structured grid.
//!
//! A [`VecField`] stores `Ex`, `Ey` and `Ez` as separate contiguous buffers
//! that always share one [`GridShape`]. All arithmetic is componentwise.
//! Combining fields of different shapes is a programming error and panics.
//!
//! Reductions ([`VecField::dot`], [`VecField::norm`]) go through the SIMD
//! kernels of `fdfd-simd`; elementwise updates are data-parallel via rayon.

use std::ops::{Add, Mul, Neg, Sub};

use fdfd_simd::{SimdCapability, bilinear_dot, norm_sqr};
use num_complex::Complex64 as C64;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::grid::{Axis, GridShape};

const ZERO: C64 = C64::new(0.0, 0.0);

#[derive(Debug, Clone, PartialEq)]
pub struct VecField {
    shape: GridShape,
    comps: [Vec<C64>; 3],
}

impl VecField {
    pub fn zeros(shape: GridShape) -> Self {
        Self::filled(shape, ZERO)
    }

    /// Every component of every cell set to `value`.
    pub fn filled(shape: GridShape, value: C64) -> Self {
        let n = shape.len();
        Self {
            shape,
            comps: [vec![value; n], vec![value; n], vec![value; n]],
        }
    }

    /// Build from per-component buffers, checking each against the grid.
    pub fn from_components(shape: GridShape, comps: [Vec<C64>; 3]) -> Result<Self> {
        for axis in Axis::ALL {
            let actual = comps[axis.index()].len();
            if actual != shape.len() {
                return Err(Error::ComponentLength {
                    axis,
                    shape,
                    expected: shape.len(),
                    actual,
                });
            }
        }
        Ok(Self { shape, comps })
    }

    /// Evaluate `f(component, i, j, k)` at every cell.
    pub fn from_fn<F>(shape: GridShape, f: F) -> Self
    where
        F: Fn(Axis, usize, usize, usize) -> C64,
    {
        let comps = Axis::ALL.map(|axis| {
            (0..shape.len())
                .map(|idx| {
                    let (i, j, k) = shape.coords(idx);
                    f(axis, i, j, k)
                })
                .collect()
        });
        Self { shape, comps }
    }

    #[inline]
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Total number of complex values across the three components.
    #[inline]
    pub fn len(&self) -> usize {
        3 * self.shape.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    #[inline]
    pub fn component(&self, axis: Axis) -> &[C64] {
        &self.comps[axis.index()]
    }

    #[inline]
    pub fn component_mut(&mut self, axis: Axis) -> &mut [C64] {
        &mut self.comps[axis.index()]
    }

    pub fn components(&self) -> &[Vec<C64>; 3] {
        &self.comps
    }

    pub fn into_components(self) -> [Vec<C64>; 3] {
        self.comps
    }

    #[inline]
    pub fn get(&self, axis: Axis, i: usize, j: usize, k: usize) -> C64 {
        self.comps[axis.index()][self.shape.idx(i, j, k)]
    }

    #[inline]
    pub fn set(&mut self, axis: Axis, i: usize, j: usize, k: usize, value: C64) {
        let idx = self.shape.idx(i, j, k);
        self.comps[axis.index()][idx] = value;
    }

    /// Iterate over all values, `Ex` first.
    pub fn iter(&self) -> impl Iterator<Item = &C64> {
        self.comps.iter().flat_map(|c| c.iter())
    }

    pub fn fill(&mut self, value: C64) {
        for c in &mut self.comps {
            c.fill(value);
        }
    }

    /// Bilinear product `sum a_i * b_i` (no conjugation).
    pub fn dot(&self, other: &VecField) -> C64 {
        self.assert_same_shape(other);
        let cap = SimdCapability::detect();
        self.comps
            .iter()
            .zip(other.comps.iter())
            .map(|(a, b)| bilinear_dot(a, b, cap))
            .sum()
    }

    /// `sum |a_i|^2`.
    pub fn norm_sqr(&self) -> f64 {
        let cap = SimdCapability::detect();
        self.comps.iter().map(|c| norm_sqr(c, cap)).sum()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.norm_sqr().sqrt()
    }

    pub fn max_abs(&self) -> f64 {
        self.iter().map(|v| v.norm()).fold(0.0, f64::max)
    }

    pub fn is_finite(&self) -> bool {
        self.iter().all(|v| v.is_finite())
    }

    pub fn conj(&self) -> VecField {
        self.map(|v| v.conj())
    }

    pub fn conj_mut(&mut self) {
        self.map_mut(|v| *v = v.conj());
    }

    pub fn scale(&self, alpha: C64) -> VecField {
        self.map(|v| v * alpha)
    }

    pub fn scale_mut(&mut self, alpha: C64) {
        self.map_mut(|v| *v *= alpha);
    }

    /// `self += alpha * x`
    pub fn axpy(&mut self, alpha: C64, x: &VecField) {
        self.zip_mut(x, |s, xv| *s += alpha * xv);
    }

    /// `self = x + beta * self`
    pub fn xpby(&mut self, x: &VecField, beta: C64) {
        self.zip_mut(x, |s, xv| *s = xv + beta * *s);
    }

    /// Elementwise `self *= other`.
    pub fn mul_assign_elementwise(&mut self, other: &VecField) {
        self.zip_mut(other, |s, o| *s *= o);
    }

    /// Elementwise `1 / self`.
    pub fn recip(&self) -> VecField {
        self.map(|v| v.inv())
    }

    pub fn map<F>(&self, f: F) -> VecField
    where
        F: Fn(C64) -> C64 + Sync,
    {
        let comps = std::array::from_fn(|c| self.comps[c].par_iter().map(|&v| f(v)).collect());
        VecField {
            shape: self.shape,
            comps,
        }
    }

    fn map_mut<F>(&mut self, f: F)
    where
        F: Fn(&mut C64) + Sync,
    {
        for c in &mut self.comps {
            c.par_iter_mut().for_each(&f);
        }
    }

    fn zip_mut<F>(&mut self, other: &VecField, f: F)
    where
        F: Fn(&mut C64, C64) + Sync,
    {
        self.assert_same_shape(other);
        for (s, o) in self.comps.iter_mut().zip(other.comps.iter()) {
            s.par_iter_mut().zip(o.par_iter()).for_each(|(sv, &ov)| f(sv, ov));
        }
    }

    fn zip_with<F>(&self, other: &VecField, f: F) -> VecField
    where
        F: Fn(C64, C64) -> C64 + Sync,
    {
        self.assert_same_shape(other);
        let comps = std::array::from_fn(|c| {
            self.comps[c]
                .par_iter()
                .zip(other.comps[c].par_iter())
                .map(|(&a, &b)| f(a, b))
                .collect()
        });
        VecField {
            shape: self.shape,
            comps,
        }
    }

    #[inline]
    fn assert_same_shape(&self, other: &VecField) {
        assert_eq!(
            self.shape, other.shape,
            "VecField shape mismatch: {} vs {}",
            self.shape, other.shape
        );
    }
}

impl Add for &VecField {
    type Output = VecField;

    fn add(self, rhs: &VecField) -> VecField {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub for &VecField {
    type Output = VecField;

    fn sub(self, rhs: &VecField) -> VecField {
        self.zip_with(rhs, |a, b| a - b)
    }
}

/// Elementwise (Hadamard) product.
impl Mul for &VecField {
    type Output = VecField;

    fn mul(self, rhs: &VecField) -> VecField {
        self.zip_with(rhs, |a, b| a * b)
    }
}

impl Mul<C64> for &VecField {
    type Output = VecField;

    fn mul(self, rhs: C64) -> VecField {
        self.scale(rhs)
    }
}

impl Mul<f64> for &VecField {
    type Output = VecField;

    fn mul(self, rhs: f64) -> VecField {
        self.map(|v| v * rhs)
    }
}

impl Neg for &VecField {
    type Output = VecField;

    fn neg(self) -> VecField {
        self.map(|v| -v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wavy(shape: GridShape, phase: f64) -> VecField {
        VecField::from_fn(shape, |axis, i, j, k| {
            let t = (i * 7 + j * 3 + k) as f64 + axis.index() as f64 * 0.5 + phase;
            C64::new(t.sin(), (0.7 * t).cos())
        })
    }

    #[test]
    fn from_components_checks_lengths() {
        let shape = GridShape::new(2, 2, 2);
        let ok = VecField::from_components(shape, [vec![ZERO; 8], vec![ZERO; 8], vec![ZERO; 8]]);
        assert!(ok.is_ok());

        let bad = VecField::from_components(shape, [vec![ZERO; 8], vec![ZERO; 7], vec![ZERO; 8]]);
        match bad {
            Err(Error::ComponentLength { axis, actual, .. }) => {
                assert_eq!(axis, Axis::Y);
                assert_eq!(actual, 7);
            }
            other => panic!("expected ComponentLength, got {:?}", other),
        }
    }

    #[test]
    fn dot_is_bilinear_and_symmetric() {
        let shape = GridShape::new(3, 2, 4);
        let a = wavy(shape, 0.0);
        let b = wavy(shape, 1.3);

        assert!((a.dot(&b) - b.dot(&a)).norm() < 1e-12);

        let expected: C64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        assert!((a.dot(&b) - expected).norm() < 1e-10);

        // Scaling one argument by i scales the product by i, not by -i.
        let i = C64::new(0.0, 1.0);
        assert!((a.scale(i).dot(&b) - i * a.dot(&b)).norm() < 1e-10);
    }

    #[test]
    fn norm_is_hermitian_magnitude() {
        let shape = GridShape::new(2, 2, 2);
        let f = VecField::filled(shape, C64::new(3.0, 4.0));
        assert!((f.norm() - (24.0f64 * 25.0).sqrt()).abs() < 1e-12);
        assert!((f.conj().dot(&f).re - f.norm_sqr()).abs() < 1e-9);
    }

    #[test]
    fn axpy_and_xpby() {
        let shape = GridShape::new(2, 3, 2);
        let x = wavy(shape, 0.2);
        let mut y = wavy(shape, 0.9);
        let y0 = y.clone();
        let alpha = C64::new(0.5, -2.0);

        y.axpy(alpha, &x);
        let expected = &y0 + &x.scale(alpha);
        assert!((&y - &expected).norm() < 1e-12);

        let mut p = y0.clone();
        p.xpby(&x, alpha);
        let expected = &x + &y0.scale(alpha);
        assert!((&p - &expected).norm() < 1e-12);
    }

    #[test]
    fn elementwise_ops() {
        let shape = GridShape::new(2, 2, 1);
        let a = wavy(shape, 0.1);
        let b = wavy(shape, 2.0);

        let prod = &a * &b;
        for axis in Axis::ALL {
            for idx in 0..shape.len() {
                let want = a.component(axis)[idx] * b.component(axis)[idx];
                assert!((prod.component(axis)[idx] - want).norm() < 1e-15);
            }
        }

        let mut c = a.clone();
        c.mul_assign_elementwise(&b);
        assert_eq!(c, prod);

        let one = &a * &a.recip();
        assert!(one.iter().all(|v| (v - C64::new(1.0, 0.0)).norm() < 1e-12));
        assert!((&(-&a) + &a).max_abs() == 0.0);
        assert_eq!((&a * 2.0).get(Axis::Z, 1, 1, 0), a.get(Axis::Z, 1, 1, 0) * 2.0);
    }

    #[test]
    fn conj_flips_imaginary_parts() {
        let shape = GridShape::new(1, 2, 3);
        let a = wavy(shape, 0.4);
        let mut b = a.clone();
        b.conj_mut();
        assert_eq!(b, a.conj());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.re, y.re);
            assert_eq!(x.im, -y.im);
        }
    }

    #[test]
    #[should_panic(expected = "shape mismatch")]
    fn mismatched_shapes_panic() {
        let a = VecField::zeros(GridShape::new(2, 2, 2));
        let b = VecField::zeros(GridShape::new(2, 2, 3));
        let _ = a.dot(&b);
    }
}
