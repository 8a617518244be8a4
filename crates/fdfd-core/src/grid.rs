//! Structured 3D grid shapes and axis bookkeeping.

use std::fmt;

use crate::error::{Error, Result};

/// One of the three Cartesian axes. Also names the field component
/// (`Ex`, `Ey`, `Ez`) that points along it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The two other axes in cyclic order, so that `(self, a, b)` is
    /// right-handed.
    #[inline]
    pub fn others(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::Z, Axis::X),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        })
    }
}

/// Cell counts of a regular grid. Storage is row-major with `z` fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridShape {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl GridShape {
    pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Like [`GridShape::new`] but rejects grids with an empty axis.
    pub fn try_new(nx: usize, ny: usize, nz: usize) -> Result<Self> {
        let shape = Self::new(nx, ny, nz);
        shape.validate()?;
        Ok(shape)
    }

    pub fn validate(&self) -> Result<()> {
        if self.len() == 0 {
            return Err(Error::EmptyGrid(*self));
        }
        Ok(())
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn extent(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => self.nx,
            Axis::Y => self.ny,
            Axis::Z => self.nz,
        }
    }

    /// Distance in the flat buffer between neighbours along `axis`.
    #[inline]
    pub fn stride(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => self.ny * self.nz,
            Axis::Y => self.nz,
            Axis::Z => 1,
        }
    }

    /// Flat index of cell `(i, j, k)`. Panics if the cell is outside the grid.
    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        assert!(
            i < self.nx && j < self.ny && k < self.nz,
            "cell ({}, {}, {}) outside {} grid",
            i,
            j,
            k,
            self
        );
        (i * self.ny + j) * self.nz + k
    }

    /// Inverse of [`GridShape::idx`].
    #[inline]
    pub fn coords(&self, idx: usize) -> (usize, usize, usize) {
        let k = idx % self.nz;
        let j = (idx / self.nz) % self.ny;
        let i = idx / (self.ny * self.nz);
        (i, j, k)
    }

    /// Coordinate of cell `idx` along `axis`.
    #[inline]
    pub fn coord(&self, idx: usize, axis: Axis) -> usize {
        let (i, j, k) = self.coords(idx);
        match axis {
            Axis::X => i,
            Axis::Y => j,
            Axis::Z => k,
        }
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.nx, self.ny, self.nz)
    }
}
